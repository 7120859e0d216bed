//! Event trace recorded by simulation.
//!
//! A trace is an immutable, ordered record of every event fed to a
//! machine, the state it met, and the state it produced.

use serde::{Deserialize, Serialize};

/// Record of one event applied to a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceStep<S, E> {
    /// The state the event was applied to
    pub state: S,
    /// The event consumed by this step
    pub event: E,
    /// The state after resolution, including any always-cascade
    pub next: S,
    /// Whether a transition matched; `false` means the event was ignored
    pub transitioned: bool,
}

/// Ordered trace of events applied to a machine.
///
/// The `record` method returns a new trace with the step added and leaves
/// the original untouched.
///
/// # Example
///
/// ```rust
/// use statecraft::core::{Trace, TraceStep};
///
/// let trace = Trace::new("idle");
/// let trace = trace.record(TraceStep {
///     state: "idle",
///     event: "start",
///     next: "running",
///     transitioned: true,
/// });
///
/// assert_eq!(trace.path(), vec![&"idle", &"running"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace<S, E> {
    initial: S,
    steps: Vec<TraceStep<S, E>>,
}

impl<S: Clone, E: Clone> Trace<S, E> {
    /// Create an empty trace starting at `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            steps: Vec::new(),
        }
    }

    /// Build a trace from steps already collected in order.
    pub fn from_steps(initial: S, steps: Vec<TraceStep<S, E>>) -> Self {
        Self { initial, steps }
    }

    /// Record a step, returning a new trace.
    ///
    /// Copies every recorded step, so building a long trace this way is
    /// quadratic; collect the steps and use [`Trace::from_steps`] instead.
    pub fn record(&self, step: TraceStep<S, E>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            initial: self.initial.clone(),
            steps,
        }
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    /// Get all recorded steps in order.
    pub fn steps(&self) -> &[TraceStep<S, E>] {
        &self.steps
    }

    /// Get the path of states traversed.
    ///
    /// Returns the initial state followed by the resulting state of every
    /// step that transitioned. Ignored events do not extend the path.
    pub fn path(&self) -> Vec<&S> {
        let mut path = vec![&self.initial];
        path.extend(
            self.steps
                .iter()
                .filter(|step| step.transitioned)
                .map(|step| &step.next),
        );
        path
    }

    /// State after the last step, or the initial state for an empty trace.
    pub fn last_state(&self) -> &S {
        self.steps
            .last()
            .map_or(&self.initial, |step| &step.next)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
