//! Append-only machine definitions.
//!
//! Every combinator borrows the definition and returns a new one holding
//! the previous registrations plus the new entry. Entries are shared
//! behind `Arc`, so branching a definition is cheap and never affects the
//! value it was derived from.

use crate::actor::EffectContext;
use crate::builder::error::{collect, ensure, BuildError, Check, ConfigError};
use crate::builder::transition::TransitionBuilder;
use crate::core::{GuardExpr, Tagged};
use crate::machine::{
    AlwaysTransition, DelayDuration, DelayEvent, DelaySpec, EffectHandler, EffectKind, Machine,
    Registration, Slot, SlotKind, StateEffect, Transition,
};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::BoxedEffect;

/// Immutable, append-only definition of a machine.
///
/// # Example
///
/// ```
/// use statecraft::builder::MachineDefinition;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Light: LightTag {
///         Red,
///         Green,
///     }
/// }
///
/// tagged_enum! {
///     enum Signal: SignalTag {
///         Next,
///     }
/// }
///
/// let base = MachineDefinition::<Light, Signal, ()>::new(Light::Red);
/// let cycling = base
///     .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
///     .on(LightTag::Green, SignalTag::Next, |_, _| Light::Red);
///
/// assert_eq!(base.registrations().len(), 0);
/// assert_eq!(cycling.registrations().len(), 2);
/// assert!(cycling.build().is_ok());
/// ```
pub struct MachineDefinition<S: Tagged, E: Tagged, Env> {
    name: String,
    initial: S,
    finals: Vec<S::Tag>,
    registrations: Vec<Registration<S, E, Env>>,
}

impl<S: Tagged, E: Tagged, Env> Clone for MachineDefinition<S, E, Env> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            initial: self.initial.clone(),
            finals: self.finals.clone(),
            registrations: self.registrations.clone(),
        }
    }
}

impl<S, E, Env> MachineDefinition<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    /// Create an empty definition starting in `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            name: "machine".to_string(),
            initial,
            finals: Vec::new(),
            registrations: Vec::new(),
        }
    }

    /// Name used in logs and checkpoints.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Replace the initial state.
    pub fn with_initial(&self, initial: S) -> Self {
        Self {
            initial,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    /// All registrations in the order they were added.
    pub fn registrations(&self) -> &[Registration<S, E, Env>] {
        &self.registrations
    }

    pub fn final_tags(&self) -> &[S::Tag] {
        &self.finals
    }

    fn push(&self, registration: Registration<S, E, Env>) -> Self {
        let mut registrations = self.registrations.clone();
        registrations.push(registration);
        Self {
            registrations,
            ..self.clone()
        }
    }

    /// Add a pre-built transition.
    pub fn add_transition(&self, transition: Transition<S, E>) -> Self {
        self.push(Registration::Transition(Arc::new(transition)))
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(&self, builder: TransitionBuilder<S, E>) -> Result<Self, BuildError> {
        Ok(self.add_transition(builder.build()?))
    }

    /// Add an unguarded transition.
    pub fn on<F>(&self, state: S::Tag, event: E::Tag, handler: F) -> Self
    where
        F: Fn(&S, &E) -> S + Send + Sync + 'static,
    {
        self.add_transition(Transition {
            state,
            event,
            guard: None,
            handler: Arc::new(handler),
            forced: false,
            effects: Vec::new(),
        })
    }

    /// Add a guarded transition. Guards for the same pair are tried in
    /// registration order.
    pub fn on_when<F>(
        &self,
        state: S::Tag,
        event: E::Tag,
        guard: GuardExpr<S>,
        handler: F,
    ) -> Self
    where
        F: Fn(&S, &E) -> S + Send + Sync + 'static,
    {
        self.add_transition(Transition {
            state,
            event,
            guard: Some(guard),
            handler: Arc::new(handler),
            forced: false,
            effects: Vec::new(),
        })
    }

    pub fn add_always(&self, always: AlwaysTransition<S>) -> Self {
        self.push(Registration::Always(Arc::new(always)))
    }

    /// Add an unguarded always-transition computed from the entered state.
    pub fn always<F>(&self, state: S::Tag, handler: F) -> Self
    where
        F: Fn(&S) -> S + Send + Sync + 'static,
    {
        self.add_always(AlwaysTransition {
            state,
            guard: None,
            handler: Arc::new(handler),
            target: None,
        })
    }

    pub fn always_when<F>(&self, state: S::Tag, guard: GuardExpr<S>, handler: F) -> Self
    where
        F: Fn(&S) -> S + Send + Sync + 'static,
    {
        self.add_always(AlwaysTransition {
            state,
            guard: Some(guard),
            handler: Arc::new(handler),
            target: None,
        })
    }

    /// Add an unguarded always-transition to a constant state.
    ///
    /// The target tag is recorded, so cycles made only of these are
    /// rejected by [`build`](Self::build).
    pub fn always_to(&self, state: S::Tag, target: S) -> Self {
        let tag = target.tag();
        self.add_always(AlwaysTransition {
            state,
            guard: None,
            handler: Arc::new(move |_: &S| target.clone()),
            target: Some(tag),
        })
    }

    pub fn always_to_when(&self, state: S::Tag, guard: GuardExpr<S>, target: S) -> Self {
        let tag = target.tag();
        self.add_always(AlwaysTransition {
            state,
            guard: Some(guard),
            handler: Arc::new(move |_: &S| target.clone()),
            target: Some(tag),
        })
    }

    pub fn add_effect(&self, effect: StateEffect<S, E, Env>) -> Self {
        self.push(Registration::Effect(Arc::new(effect)))
    }

    fn inline_effect<F>(&self, state: S::Tag, kind: EffectKind, effect: F) -> Self
    where
        F: Fn(&EffectContext<S, E>) -> BoxedEffect<(), Infallible, Env> + Send + Sync + 'static,
    {
        self.add_effect(StateEffect {
            state,
            kind,
            handler: EffectHandler::Inline(Arc::new(effect)),
        })
    }

    /// Run an effect every time `state` is entered. All entry effects of a
    /// state run, in registration order.
    pub fn on_enter<F>(&self, state: S::Tag, effect: F) -> Self
    where
        F: Fn(&EffectContext<S, E>) -> BoxedEffect<(), Infallible, Env> + Send + Sync + 'static,
    {
        self.inline_effect(state, EffectKind::Enter, effect)
    }

    /// Run an effect every time `state` is exited.
    pub fn on_exit<F>(&self, state: S::Tag, effect: F) -> Self
    where
        F: Fn(&EffectContext<S, E>) -> BoxedEffect<(), Infallible, Env> + Send + Sync + 'static,
    {
        self.inline_effect(state, EffectKind::Exit, effect)
    }

    /// Run the named effect slot on entry.
    pub fn on_enter_slot(&self, state: S::Tag, name: impl Into<String>) -> Self {
        self.add_effect(StateEffect {
            state,
            kind: EffectKind::Enter,
            handler: EffectHandler::Slot(name.into()),
        })
    }

    /// Run the named effect slot on exit.
    pub fn on_exit_slot(&self, state: S::Tag, name: impl Into<String>) -> Self {
        self.add_effect(StateEffect {
            state,
            kind: EffectKind::Exit,
            handler: EffectHandler::Slot(name.into()),
        })
    }

    pub fn add_delay(&self, delay: DelaySpec<S, E>) -> Self {
        self.push(Registration::Delay(Arc::new(delay)))
    }

    /// Send `event` to self after `state` has been held for `duration`.
    ///
    /// When several delays are registered for one state, the last one wins.
    pub fn delay(&self, state: S::Tag, duration: Duration, event: E) -> Self {
        self.add_delay(DelaySpec {
            state,
            duration: DelayDuration::Fixed(duration),
            event: DelayEvent::Fixed(event),
        })
    }

    /// Delay whose duration and event are computed from the entered state.
    pub fn delay_with<D, F>(&self, state: S::Tag, duration: D, event: F) -> Self
    where
        D: Fn(&S) -> Duration + Send + Sync + 'static,
        F: Fn(&S) -> E + Send + Sync + 'static,
    {
        self.add_delay(DelaySpec {
            state,
            duration: DelayDuration::Computed(Arc::new(duration)),
            event: DelayEvent::Computed(Arc::new(event)),
        })
    }

    pub fn add_slot(&self, slot: Slot<S, E>) -> Self {
        self.push(Registration::Slot(Arc::new(slot)))
    }

    /// Declare a named guard slot owned by `state` (and optionally `event`).
    pub fn guard_slot(
        &self,
        state: S::Tag,
        event: Option<E::Tag>,
        name: impl Into<String>,
    ) -> Self {
        self.add_slot(Slot {
            kind: SlotKind::Guard,
            state,
            event,
            name: name.into(),
        })
    }

    /// Declare a named effect slot owned by `state` (and optionally `event`).
    pub fn effect_slot(
        &self,
        state: S::Tag,
        event: Option<E::Tag>,
        name: impl Into<String>,
    ) -> Self {
        self.add_slot(Slot {
            kind: SlotKind::Effect,
            state,
            event,
            name: name.into(),
        })
    }

    /// Mark a state tag as final. Marking the same tag twice is a no-op.
    pub fn final_state(&self, tag: S::Tag) -> Self {
        if self.finals.contains(&tag) {
            return self.clone();
        }
        let mut finals = self.finals.clone();
        finals.push(tag);
        Self {
            finals,
            ..self.clone()
        }
    }

    /// Validate and index the definition.
    ///
    /// Every problem is reported at once:
    /// - guard or effect slots referenced but never declared
    /// - a slot name declared both as a guard and as an effect
    /// - cycles of unconditional always-transitions with constant targets
    pub fn build(&self) -> Result<Machine<S, E, Env>, BuildError> {
        let mut checks = self.check_slots();
        checks.extend(self.check_always_cycles());
        collect(checks)?;
        Ok(Machine::index(self))
    }

    fn check_slots(&self) -> Vec<Check> {
        let mut declared: HashMap<&str, SlotKind> = HashMap::new();
        let mut checks = Vec::new();

        for registration in &self.registrations {
            if let Registration::Slot(slot) = registration {
                match declared.get(slot.name.as_str()) {
                    Some(kind) => checks.push(ensure(*kind == slot.kind, || {
                        ConfigError::ConflictingSlot {
                            name: slot.name.clone(),
                        }
                    })),
                    None => {
                        declared.insert(slot.name.as_str(), slot.kind);
                    }
                }
            }
        }

        let mut require = |kind: SlotKind, name: &str| {
            checks.push(ensure(declared.get(name) == Some(&kind), || {
                ConfigError::UndeclaredSlot {
                    kind,
                    name: name.to_string(),
                }
            }));
        };

        for registration in &self.registrations {
            match registration {
                Registration::Transition(transition) => {
                    if let Some(guard) = &transition.guard {
                        guard
                            .slot_names()
                            .into_iter()
                            .for_each(|name| require(SlotKind::Guard, name));
                    }
                    transition
                        .effects
                        .iter()
                        .for_each(|name| require(SlotKind::Effect, name));
                }
                Registration::Always(always) => {
                    if let Some(guard) = &always.guard {
                        guard
                            .slot_names()
                            .into_iter()
                            .for_each(|name| require(SlotKind::Guard, name));
                    }
                }
                Registration::Effect(effect) => {
                    if let EffectHandler::Slot(name) = &effect.handler {
                        require(SlotKind::Effect, name);
                    }
                }
                Registration::Delay(_) | Registration::Slot(_) => {}
            }
        }

        checks
    }

    /// Follow the first always-transition of every state when it is
    /// unconditional with a known target; any loop is an endless cascade.
    fn check_always_cycles(&self) -> Vec<Check> {
        let mut order: Vec<S::Tag> = Vec::new();
        let mut edges: HashMap<S::Tag, Option<S::Tag>> = HashMap::new();

        for registration in &self.registrations {
            if let Registration::Always(always) = registration {
                if edges.contains_key(&always.state) {
                    continue;
                }
                let edge = match (&always.guard, always.target) {
                    (None, Some(target)) if !self.finals.contains(&always.state) => Some(target),
                    _ => None,
                };
                order.push(always.state);
                edges.insert(always.state, edge);
            }
        }

        let mut reported: HashSet<S::Tag> = HashSet::new();
        let mut checks = Vec::new();

        for start in order {
            let mut path = vec![start];
            let mut current = start;
            while let Some(Some(next)) = edges.get(&current) {
                if let Some(pos) = path.iter().position(|tag| tag == next) {
                    let cycle = &path[pos..];
                    if cycle.iter().all(|tag| reported.insert(*tag)) {
                        let mut names: Vec<String> =
                            cycle.iter().map(|tag| format!("{tag:?}")).collect();
                        names.push(format!("{next:?}"));
                        checks.push(ensure(false, || ConfigError::AlwaysCycle { path: names }));
                    }
                    break;
                }
                path.push(*next);
                current = *next;
            }
        }

        checks
    }
}
