//! Build errors for machine definitions, transitions and slot bindings.

use crate::machine::SlotKind;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Errors that can occur when building transitions, machines and bindings.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Transition source state not specified. Call .from(tag)")]
    MissingFromState,

    #[error("Transition event not specified. Call .on(tag)")]
    MissingEvent,

    #[error("Transition handler not specified. Call .handle(f) or .to(state)")]
    MissingHandler,

    #[error("Invalid machine configuration: {}", join(.0))]
    Invalid(Vec<ConfigError>),
}

/// A single configuration problem found while validating a definition or
/// closing a bindings table. All problems are reported together.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{kind} slot '{name}' is referenced but never declared")]
    UndeclaredSlot { kind: SlotKind, name: String },

    #[error("slot '{name}' is declared as both a guard and an effect")]
    ConflictingSlot { name: String },

    #[error("{kind} slot '{name}' is declared but not bound")]
    UnboundSlot { kind: SlotKind, name: String },

    #[error("{kind} implementation '{name}' does not match any declared slot")]
    UnknownBinding { kind: SlotKind, name: String },

    #[error("always-transitions cycle without end: {}", .path.join(" -> "))]
    AlwaysCycle { path: Vec<String> },
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) type Check = Validation<(), NonEmptyVec<ConfigError>>;

pub(crate) fn ensure(ok: bool, error: impl FnOnce() -> ConfigError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// Accumulate every failed check into a single `BuildError::Invalid`.
pub(crate) fn collect(checks: Vec<Check>) -> Result<(), BuildError> {
    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(BuildError::Invalid(errors.iter().cloned().collect())),
    }
}
