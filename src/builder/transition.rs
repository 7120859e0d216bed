//! Builder for constructing state transitions.

use crate::builder::error::BuildError;
use crate::core::{Guard, GuardExpr, Tagged};
use crate::machine::{Transition, TransitionHandler};
use std::sync::Arc;

/// Builder for constructing transitions with a fluent API.
///
/// # Example
///
/// ```
/// use statecraft::builder::TransitionBuilder;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Reading: ReadingTag {
///         Idle { value: u32 },
///         High,
///     }
/// }
///
/// tagged_enum! {
///     enum Command: CommandTag {
///         Check,
///     }
/// }
///
/// let transition = TransitionBuilder::<Reading, Command>::new()
///     .from(ReadingTag::Idle)
///     .on(CommandTag::Check)
///     .when_slot("isHigh")
///     .to(Reading::High)
///     .build()
///     .unwrap();
///
/// assert!(!transition.forced);
/// ```
pub struct TransitionBuilder<S: Tagged, E: Tagged> {
    from: Option<S::Tag>,
    event: Option<E::Tag>,
    guard: Option<GuardExpr<S>>,
    handler: Option<TransitionHandler<S, E>>,
    forced: bool,
    effects: Vec<String>,
}

impl<S: Tagged, E: Tagged> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            event: None,
            guard: None,
            handler: None,
            forced: false,
            effects: Vec::new(),
        }
    }

    /// Set the source state tag (required).
    pub fn from(mut self, tag: S::Tag) -> Self {
        self.from = Some(tag);
        self
    }

    /// Set the triggering event tag (required).
    pub fn on(mut self, tag: E::Tag) -> Self {
        self.event = Some(tag);
        self
    }

    /// Set the guard expression (optional). Replaces any earlier guard.
    pub fn guard(mut self, guard: GuardExpr<S>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(GuardExpr::Predicate(Guard::new(predicate)));
        self
    }

    /// Guard on a named guard slot (optional).
    pub fn when_slot(mut self, name: impl Into<String>) -> Self {
        self.guard = Some(GuardExpr::slot(name));
        self
    }

    /// Mark this branch as the fallback of a guard cascade.
    pub fn otherwise(mut self) -> Self {
        self.guard = Some(GuardExpr::otherwise());
        self
    }

    /// Run exit/entry effects even when the result keeps the current tag.
    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }

    /// Invoke a named effect slot after the transition is applied.
    pub fn effect(mut self, name: impl Into<String>) -> Self {
        self.effects.push(name.into());
        self
    }

    /// Set the handler computing the next state (required).
    pub fn handle<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &E) -> S + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Set a constant target state as the handler.
    pub fn to(self, target: S) -> Self {
        self.handle(move |_, _| target.clone())
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E>, BuildError> {
        let state = self.from.ok_or(BuildError::MissingFromState)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;
        let handler = self.handler.ok_or(BuildError::MissingHandler)?;

        Ok(Transition {
            state,
            event,
            guard: self.guard,
            handler,
            forced: self.forced,
            effects: self.effects,
        })
    }
}

impl<S: Tagged, E: Tagged> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
