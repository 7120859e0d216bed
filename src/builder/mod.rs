//! Builder API for ergonomic machine construction.
//!
//! This module provides the append-only [`MachineDefinition`], the fluent
//! [`TransitionBuilder`] and the [`tagged_enum!`](crate::tagged_enum) macro
//! for declaring states and events with minimal boilerplate.

pub mod definition;
pub mod error;
pub mod macros;
pub mod transition;

pub use definition::MachineDefinition;
pub use error::{BuildError, ConfigError};
pub use transition::TransitionBuilder;

use crate::core::{Guard, GuardExpr, Tagged};
use crate::machine::Transition;
use std::sync::Arc;

/// Create an unguarded transition to a constant target.
///
/// # Example
///
/// ```
/// use statecraft::builder::simple_transition;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Door: DoorTag {
///         Open,
///         Closed,
///     }
/// }
///
/// tagged_enum! {
///     enum Action: ActionTag {
///         Close,
///     }
/// }
///
/// let transition =
///     simple_transition::<Door, Action>(DoorTag::Open, ActionTag::Close, Door::Closed);
/// assert!(transition.applies_to(&Door::Open, &Action::Close));
/// ```
pub fn simple_transition<S, E>(state: S::Tag, event: E::Tag, target: S) -> Transition<S, E>
where
    S: Tagged,
    E: Tagged,
{
    Transition {
        state,
        event,
        guard: None,
        handler: Arc::new(move |_: &S, _: &E| target.clone()),
        forced: false,
        effects: Vec::new(),
    }
}

/// Create a transition to a constant target, guarded by a predicate.
pub fn guarded_transition<S, E, F>(
    state: S::Tag,
    event: E::Tag,
    target: S,
    guard: F,
) -> Transition<S, E>
where
    S: Tagged,
    E: Tagged,
    F: Fn(&S) -> bool + Send + Sync + 'static,
{
    Transition {
        guard: Some(GuardExpr::Predicate(Guard::new(guard))),
        ..simple_transition(state, event, target)
    }
}
