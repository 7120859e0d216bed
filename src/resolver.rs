//! Transition resolution: guard cascade plus always-cascade.
//!
//! Resolution never mutates anything. Given a machine, its bindings, the
//! current state and an event, it reports the microsteps an actor (or a
//! simulation) should apply. Guards are evaluated through the bindings, so
//! resolution is async.

use crate::core::Tagged;
use crate::machine::{Machine, Transition};
use crate::slots::Bindings;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised while resolving an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// An always-cascade re-entered a tag it had already visited.
    #[error("always-transitions revisit state {tag} within one cascade")]
    AlwaysCycle { tag: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Step taken by the transition that consumed the event.
    Event,
    /// Step taken by an always-transition on entry.
    Always,
}

/// One state change inside a resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Microstep<S> {
    pub from: S,
    pub to: S,
    pub kind: StepKind,
    /// Forced re-entry: exit and entry effects run even for the same tag.
    pub reenter: bool,
}

impl<S: Tagged> Microstep<S> {
    /// Whether exit/entry effects run for this step.
    pub fn runs_effects(&self) -> bool {
        self.reenter || self.from.tag() != self.to.tag()
    }
}

/// Outcome of resolving one event.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution<S> {
    /// State after the event step and any always-cascade.
    pub next: S,
    /// Event step first, followed by every always step, in order.
    pub steps: Vec<Microstep<S>>,
    pub forced: bool,
    /// Named effect slots of the selected transition.
    pub effects: Vec<String>,
}

/// Select the first transition for the pair whose guard passes.
///
/// Guards of later transitions are not evaluated once one passes.
pub async fn select<'m, S, E, Env>(
    machine: &'m Machine<S, E, Env>,
    bindings: &Bindings<S, E, Env>,
    state: &S,
    event: &E,
) -> Option<&'m Arc<Transition<S, E>>>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    for transition in machine.transitions_for(state.tag(), event.tag()) {
        if bindings
            .passes(transition.guard.as_ref(), state, Some(event))
            .await
        {
            return Some(transition);
        }
    }
    None
}

/// Resolve an event against a state.
///
/// Returns `Ok(None)` when no transition matches; the event is then a
/// no-op for this state.
///
/// # Example
///
/// ```
/// use statecraft::builder::MachineDefinition;
/// use statecraft::resolver::resolve;
/// use statecraft::slots::Bindings;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Door: DoorTag {
///         Open,
///         Closed,
///         Locked,
///     }
/// }
///
/// tagged_enum! {
///     enum Action: ActionTag {
///         Close,
///     }
/// }
///
/// let machine = MachineDefinition::<Door, Action, ()>::new(Door::Open)
///     .on(DoorTag::Open, ActionTag::Close, |_, _| Door::Closed)
///     .always_to(DoorTag::Closed, Door::Locked)
///     .build()
///     .unwrap();
/// let bindings = Bindings::empty(());
///
/// let resolution = futures::executor::block_on(resolve(
///     &machine,
///     &bindings,
///     &Door::Open,
///     &Action::Close,
/// ))
/// .unwrap()
/// .unwrap();
///
/// assert_eq!(resolution.next, Door::Locked);
/// assert_eq!(resolution.steps.len(), 2);
/// ```
pub async fn resolve<S, E, Env>(
    machine: &Machine<S, E, Env>,
    bindings: &Bindings<S, E, Env>,
    state: &S,
    event: &E,
) -> Result<Option<Resolution<S>>, ResolveError>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    let Some(transition) = select(machine, bindings, state, event).await else {
        debug!(
            state = state.name(),
            event = event.name(),
            "no transition matched"
        );
        return Ok(None);
    };

    let next = (transition.handler)(state, event);
    let mut steps = vec![Microstep {
        from: state.clone(),
        to: next.clone(),
        kind: StepKind::Event,
        reenter: transition.forced,
    }];
    let next = cascade(machine, bindings, next, &mut steps).await?;

    Ok(Some(Resolution {
        next,
        steps,
        forced: transition.forced,
        effects: transition.effects.clone(),
    }))
}

/// Run the always-cascade from `state` alone.
///
/// Used when a state is entered without an event: actor start and restore.
pub async fn settle<S, E, Env>(
    machine: &Machine<S, E, Env>,
    bindings: &Bindings<S, E, Env>,
    state: &S,
) -> Result<Vec<Microstep<S>>, ResolveError>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    let mut steps = Vec::new();
    cascade(machine, bindings, state.clone(), &mut steps).await?;
    Ok(steps)
}

async fn cascade<S, E, Env>(
    machine: &Machine<S, E, Env>,
    bindings: &Bindings<S, E, Env>,
    mut current: S,
    steps: &mut Vec<Microstep<S>>,
) -> Result<S, ResolveError>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
{
    let mut visited = HashSet::from([current.tag()]);

    loop {
        if machine.is_final(current.tag()) {
            return Ok(current);
        }

        let mut matched = None;
        for always in machine.always_for(current.tag()) {
            if bindings.passes(always.guard.as_ref(), &current, None).await {
                matched = Some(always);
                break;
            }
        }
        let Some(always) = matched else {
            return Ok(current);
        };

        let next = (always.handler)(&current);
        if !visited.insert(next.tag()) {
            let tag = format!("{:?}", next.tag());
            error!(from = current.name(), to = next.name(), "always-cascade cycle");
            return Err(ResolveError::AlwaysCycle { tag });
        }

        steps.push(Microstep {
            from: current,
            to: next.clone(),
            kind: StepKind::Always,
            reenter: false,
        });
        current = next;
    }
}
