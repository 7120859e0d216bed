//! Registration entries held by a machine definition.
//!
//! Every extension point a definition accepts is one of a closed set of
//! kinds: ordinary transitions, always-transitions, enter/exit effects,
//! delays and slot declarations.

use crate::actor::EffectContext;
use crate::core::{GuardExpr, Tagged};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::BoxedEffect;

/// Handler producing the next state of an ordinary transition.
pub type TransitionHandler<S, E> = Arc<dyn Fn(&S, &E) -> S + Send + Sync>;

/// Handler producing the next state of an always-transition.
pub type AlwaysHandler<S> = Arc<dyn Fn(&S) -> S + Send + Sync>;

/// Factory for a fresh effect on each invocation.
///
/// Effects cannot fail (`Infallible`) and read their capabilities from `Env`.
pub type EffectFn<S, E, Env> =
    Arc<dyn Fn(&EffectContext<S, E>) -> BoxedEffect<(), Infallible, Env> + Send + Sync>;

/// A transition from one state tag on one event tag.
pub struct Transition<S: Tagged, E: Tagged> {
    pub state: S::Tag,
    pub event: E::Tag,
    pub guard: Option<GuardExpr<S>>,
    pub handler: TransitionHandler<S, E>,
    /// Run exit/entry effects even when the result keeps the same tag.
    pub forced: bool,
    /// Named effect slots invoked after the transition is applied.
    pub effects: Vec<String>,
}

impl<S: Tagged, E: Tagged> Transition<S, E> {
    /// Check whether this transition is registered for the pair (pure).
    ///
    /// Guards are not evaluated here; see [`crate::resolver::resolve`].
    pub fn applies_to(&self, state: &S, event: &E) -> bool {
        self.state == state.tag() && self.event == event.tag()
    }
}

impl<S: Tagged, E: Tagged> Clone for Transition<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            event: self.event,
            guard: self.guard.clone(),
            handler: Arc::clone(&self.handler),
            forced: self.forced,
            effects: self.effects.clone(),
        }
    }
}

impl<S: Tagged, E: Tagged> fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("state", &self.state)
            .field("event", &self.event)
            .field("guard", &self.guard)
            .field("forced", &self.forced)
            .field("effects", &self.effects)
            .finish()
    }
}

/// Guard-only transition evaluated every time its state is entered.
pub struct AlwaysTransition<S: Tagged> {
    pub state: S::Tag,
    pub guard: Option<GuardExpr<S>>,
    pub handler: AlwaysHandler<S>,
    /// Declared target tag, known when the target is a constant state.
    pub target: Option<S::Tag>,
}

impl<S: Tagged> Clone for AlwaysTransition<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            guard: self.guard.clone(),
            handler: Arc::clone(&self.handler),
            target: self.target,
        }
    }
}

impl<S: Tagged> fmt::Debug for AlwaysTransition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlwaysTransition")
            .field("state", &self.state)
            .field("guard", &self.guard)
            .field("target", &self.target)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Enter,
    Exit,
}

/// Implementation of a state effect: inline, or a named effect slot.
pub enum EffectHandler<S: Tagged, E: Tagged, Env> {
    Inline(EffectFn<S, E, Env>),
    Slot(String),
}

impl<S: Tagged, E: Tagged, Env> Clone for EffectHandler<S, E, Env> {
    fn clone(&self) -> Self {
        match self {
            EffectHandler::Inline(f) => EffectHandler::Inline(Arc::clone(f)),
            EffectHandler::Slot(name) => EffectHandler::Slot(name.clone()),
        }
    }
}

impl<S: Tagged, E: Tagged, Env> fmt::Debug for EffectHandler<S, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectHandler::Inline(_) => f.write_str("Inline(<fn>)"),
            EffectHandler::Slot(name) => write!(f, "Slot({name})"),
        }
    }
}

/// Effect run when a state is entered or exited.
pub struct StateEffect<S: Tagged, E: Tagged, Env> {
    pub state: S::Tag,
    pub kind: EffectKind,
    pub handler: EffectHandler<S, E, Env>,
}

impl<S: Tagged, E: Tagged, Env> Clone for StateEffect<S, E, Env> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            kind: self.kind,
            handler: self.handler.clone(),
        }
    }
}

impl<S: Tagged, E: Tagged, Env> fmt::Debug for StateEffect<S, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateEffect")
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("handler", &self.handler)
            .finish()
    }
}

pub enum DelayDuration<S> {
    Fixed(Duration),
    Computed(Arc<dyn Fn(&S) -> Duration + Send + Sync>),
}

impl<S> DelayDuration<S> {
    pub fn for_state(&self, state: &S) -> Duration {
        match self {
            DelayDuration::Fixed(duration) => *duration,
            DelayDuration::Computed(f) => f(state),
        }
    }
}

impl<S> Clone for DelayDuration<S> {
    fn clone(&self) -> Self {
        match self {
            DelayDuration::Fixed(duration) => DelayDuration::Fixed(*duration),
            DelayDuration::Computed(f) => DelayDuration::Computed(Arc::clone(f)),
        }
    }
}

impl<S> From<Duration> for DelayDuration<S> {
    fn from(duration: Duration) -> Self {
        DelayDuration::Fixed(duration)
    }
}

pub enum DelayEvent<S, E> {
    Fixed(E),
    Computed(Arc<dyn Fn(&S) -> E + Send + Sync>),
}

impl<S, E: Clone> DelayEvent<S, E> {
    pub fn for_state(&self, state: &S) -> E {
        match self {
            DelayEvent::Fixed(event) => event.clone(),
            DelayEvent::Computed(f) => f(state),
        }
    }
}

impl<S, E: Clone> Clone for DelayEvent<S, E> {
    fn clone(&self) -> Self {
        match self {
            DelayEvent::Fixed(event) => DelayEvent::Fixed(event.clone()),
            DelayEvent::Computed(f) => DelayEvent::Computed(Arc::clone(f)),
        }
    }
}

/// Self-scheduled event fired after a state has been held for a duration.
pub struct DelaySpec<S: Tagged, E: Tagged> {
    pub state: S::Tag,
    pub duration: DelayDuration<S>,
    pub event: DelayEvent<S, E>,
}

impl<S: Tagged, E: Tagged> Clone for DelaySpec<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            duration: self.duration.clone(),
            event: self.event.clone(),
        }
    }
}

impl<S: Tagged, E: Tagged> fmt::Debug for DelaySpec<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelaySpec")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Guard,
    Effect,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Guard => f.write_str("guard"),
            SlotKind::Effect => f.write_str("effect"),
        }
    }
}

/// Declared extension point whose implementation is bound separately.
pub struct Slot<S: Tagged, E: Tagged> {
    pub kind: SlotKind,
    pub state: S::Tag,
    pub event: Option<E::Tag>,
    pub name: String,
}

impl<S: Tagged, E: Tagged> Clone for Slot<S, E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            state: self.state,
            event: self.event,
            name: self.name.clone(),
        }
    }
}

impl<S: Tagged, E: Tagged> fmt::Debug for Slot<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("event", &self.event)
            .field("name", &self.name)
            .finish()
    }
}

/// One registration in a definition, in the order it was added.
pub enum Registration<S: Tagged, E: Tagged, Env> {
    Transition(Arc<Transition<S, E>>),
    Always(Arc<AlwaysTransition<S>>),
    Effect(Arc<StateEffect<S, E, Env>>),
    Delay(Arc<DelaySpec<S, E>>),
    Slot(Arc<Slot<S, E>>),
}

impl<S: Tagged, E: Tagged, Env> Clone for Registration<S, E, Env> {
    fn clone(&self) -> Self {
        match self {
            Registration::Transition(t) => Registration::Transition(Arc::clone(t)),
            Registration::Always(a) => Registration::Always(Arc::clone(a)),
            Registration::Effect(e) => Registration::Effect(Arc::clone(e)),
            Registration::Delay(d) => Registration::Delay(Arc::clone(d)),
            Registration::Slot(s) => Registration::Slot(Arc::clone(s)),
        }
    }
}

impl<S: Tagged, E: Tagged, Env> fmt::Debug for Registration<S, E, Env> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Transition(t) => fmt::Debug::fmt(t, f),
            Registration::Always(a) => fmt::Debug::fmt(a, f),
            Registration::Effect(e) => fmt::Debug::fmt(e, f),
            Registration::Delay(d) => fmt::Debug::fmt(d, f),
            Registration::Slot(s) => fmt::Debug::fmt(s, f),
        }
    }
}
