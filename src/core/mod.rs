//! Core machine types.
//!
//! This module contains the pure building blocks shared by the definition,
//! resolver and runtime:
//! - Tagged variants via the `Tagged` trait
//! - Guard predicates and composable guard expressions
//! - Immutable simulation traces
//!
//! Nothing in this module performs side effects.

mod guard;
mod tagged;
mod trace;

pub use guard::{Guard, GuardExpr};
pub use tagged::Tagged;
pub use trace::{Trace, TraceStep};
