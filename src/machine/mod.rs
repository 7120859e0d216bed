//! Transition index: registration entries and the built machine.
//!
//! # Key Concepts
//!
//! - **Entries**: transitions, always-transitions, state effects, delays
//!   and slot declarations, each keyed by tags
//! - **Machine**: the validated, immutable index an actor or simulation
//!   runs against
//!
//! Handlers are stored as factories behind `Arc`; effect handlers produce a
//! fresh stillwater effect on every invocation.

mod entries;
mod index;

pub use entries::{
    AlwaysHandler, AlwaysTransition, DelayDuration, DelayEvent, DelaySpec, EffectFn,
    EffectHandler, EffectKind, Registration, Slot, SlotKind, StateEffect, Transition,
    TransitionHandler,
};
pub use index::Machine;
