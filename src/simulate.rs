//! Effect-free replay of an event sequence.
//!
//! Simulation runs the resolver alone: no entry or exit effects, no named
//! transition effects, no timers. Only guards are evaluated, so the result
//! depends on the machine, the bindings and the events and nothing else.

use crate::builder::BuildError;
use crate::core::{Tagged, Trace, TraceStep};
use crate::machine::Machine;
use crate::resolver::{resolve, settle, ResolveError};
use crate::slots::Bindings;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SimulateError {
    /// The bindings do not implement every slot the machine declares
    #[error(transparent)]
    Config(#[from] BuildError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Result of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation<S, E> {
    pub final_state: S,
    pub trace: Trace<S, E>,
}

/// Replay `events` against the machine's initial state.
///
/// The bindings are verified against the machine before anything runs.
/// The initial state is settled through its always-cascade first. Events
/// that match no transition, and every event after a final state is
/// reached, are recorded as not transitioned.
///
/// # Example
///
/// ```
/// use statecraft::builder::MachineDefinition;
/// use statecraft::simulate::simulate;
/// use statecraft::slots::Bindings;
/// use statecraft::tagged_enum;
///
/// tagged_enum! {
///     enum Light: LightTag {
///         Red,
///         Green,
///         Off,
///     }
/// }
///
/// tagged_enum! {
///     enum Signal: SignalTag {
///         Next,
///         PowerOff,
///     }
/// }
///
/// let machine = MachineDefinition::<Light, Signal, ()>::new(Light::Red)
///     .on(LightTag::Red, SignalTag::Next, |_, _| Light::Green)
///     .on(LightTag::Green, SignalTag::Next, |_, _| Light::Red)
///     .on(LightTag::Green, SignalTag::PowerOff, |_, _| Light::Off)
///     .final_state(LightTag::Off)
///     .build()
///     .unwrap();
///
/// let run = futures::executor::block_on(simulate(
///     &machine,
///     &Bindings::empty(()),
///     vec![Signal::Next, Signal::PowerOff, Signal::Next],
/// ))
/// .unwrap();
///
/// assert_eq!(run.final_state, Light::Off);
/// assert_eq!(run.trace.len(), 3);
/// assert_eq!(run.trace.path(), vec![&Light::Red, &Light::Green, &Light::Off]);
/// ```
pub async fn simulate<S, E, Env, I>(
    machine: &Machine<S, E, Env>,
    bindings: &Bindings<S, E, Env>,
    events: I,
) -> Result<Simulation<S, E>, SimulateError>
where
    S: Tagged,
    E: Tagged,
    Env: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = E>,
{
    bindings.verify(machine)?;

    let initial = machine.initial().clone();
    let mut state = settle(machine, bindings, &initial)
        .await?
        .pop()
        .map_or(initial, |step| step.to);
    let start = state.clone();
    let mut steps = Vec::new();

    for event in events {
        let resolution = if machine.is_final(state.tag()) {
            debug!(state = state.name(), event = event.name(), "event after final state");
            None
        } else {
            resolve(machine, bindings, &state, &event).await?
        };

        let (next, transitioned) = match resolution {
            Some(resolution) => (resolution.next, true),
            None => (state.clone(), false),
        };
        steps.push(TraceStep {
            state,
            event,
            next: next.clone(),
            transitioned,
        });
        state = next;
    }

    Ok(Simulation {
        final_state: state,
        trace: Trace::from_steps(start, steps),
    })
}
