//! Built, immutable machine.

use crate::builder::MachineDefinition;
use crate::core::Tagged;
use crate::machine::entries::{
    AlwaysTransition, DelaySpec, EffectHandler, EffectKind, Registration, Slot, Transition,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

struct Index<S: Tagged, E: Tagged, Env> {
    name: String,
    initial: S,
    finals: HashSet<S::Tag>,
    transitions: HashMap<(S::Tag, E::Tag), Vec<Arc<Transition<S, E>>>>,
    always: HashMap<S::Tag, Vec<Arc<AlwaysTransition<S>>>>,
    effects: HashMap<(S::Tag, EffectKind), Vec<EffectHandler<S, E, Env>>>,
    delays: HashMap<S::Tag, Arc<DelaySpec<S, E>>>,
    slots: Vec<Arc<Slot<S, E>>>,
}

/// A validated machine, indexed for lookup by tag.
///
/// Cloning is cheap and every clone shares the same immutable index, so
/// any number of actors can run one machine.
pub struct Machine<S: Tagged, E: Tagged, Env> {
    inner: Arc<Index<S, E, Env>>,
}

impl<S: Tagged, E: Tagged, Env> Clone for Machine<S, E, Env> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, E, Env> Machine<S, E, Env>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    /// Index a definition that has already been validated.
    pub(crate) fn index(definition: &MachineDefinition<S, E, Env>) -> Self {
        let mut index = Index {
            name: definition.name().to_string(),
            initial: definition.initial().clone(),
            finals: definition.final_tags().iter().copied().collect(),
            transitions: HashMap::new(),
            always: HashMap::new(),
            effects: HashMap::new(),
            delays: HashMap::new(),
            slots: Vec::new(),
        };

        for registration in definition.registrations() {
            match registration {
                Registration::Transition(t) => index
                    .transitions
                    .entry((t.state, t.event))
                    .or_default()
                    .push(Arc::clone(t)),
                Registration::Always(a) => {
                    index.always.entry(a.state).or_default().push(Arc::clone(a))
                }
                Registration::Effect(e) => index
                    .effects
                    .entry((e.state, e.kind))
                    .or_default()
                    .push(e.handler.clone()),
                Registration::Delay(d) => {
                    index.delays.insert(d.state, Arc::clone(d));
                }
                Registration::Slot(s) => index.slots.push(Arc::clone(s)),
            }
        }

        Self {
            inner: Arc::new(index),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn initial(&self) -> &S {
        &self.inner.initial
    }

    pub fn is_final(&self, tag: S::Tag) -> bool {
        self.inner.finals.contains(&tag)
    }

    /// Transitions registered for the pair, in registration order.
    pub fn transitions_for(&self, state: S::Tag, event: E::Tag) -> &[Arc<Transition<S, E>>] {
        self.inner
            .transitions
            .get(&(state, event))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Always-transitions registered for the tag, in registration order.
    pub fn always_for(&self, state: S::Tag) -> &[Arc<AlwaysTransition<S>>] {
        self.inner
            .always
            .get(&state)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Enter or exit effects of the tag, in registration order.
    pub fn effects_for(&self, state: S::Tag, kind: EffectKind) -> &[EffectHandler<S, E, Env>] {
        self.inner
            .effects
            .get(&(state, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Active delay of the tag (the last one registered).
    pub fn delay_for(&self, state: S::Tag) -> Option<&DelaySpec<S, E>> {
        self.inner.delays.get(&state).map(Arc::as_ref)
    }

    /// Declared slots in declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot<S, E>> {
        self.inner.slots.iter().map(Arc::as_ref)
    }

    /// Check whether any ordinary transition is registered for the pair,
    /// ignoring guards.
    pub fn handles(&self, state: S::Tag, event: E::Tag) -> bool {
        !self.transitions_for(state, event).is_empty()
    }
}
