//! Named guard and effect slots.
//!
//! A machine declares slots by name; their implementations are supplied
//! afterwards in a [`SlotTable`] and closed into [`Bindings`] against the
//! built machine. Bindings carry the injected capabilities (`Env`) and are
//! passed explicitly to the resolver, simulations and actors.

mod table;

pub use table::{Bindings, GuardFn, SlotTable};
