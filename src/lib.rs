//! Statecraft: a declarative finite state machine runtime
//!
//! Machines are described as data: tagged state and event variants plus a
//! table of transitions, always-transitions, entry/exit effects, delays and
//! named slots. The same immutable machine can be replayed effect-free with
//! [`simulate`](simulate::simulate) or run by any number of actors, each
//! processing its own mailbox one event at a time.
//!
//! # Core Concepts
//!
//! - **Tagged variants**: states and events dispatch on their discriminant
//!   via the `Tagged` trait
//! - **Guard cascade**: the first transition (in registration order) whose
//!   guard passes is taken
//! - **Always-cascade**: guard-only transitions evaluated on every entry
//! - **Slots**: named guards and effects bound after the machine is built,
//!   with capabilities injected through stillwater effects
//! - **Actors**: serialized run loops with entry/exit effects, a delay timer
//!   and state-scoped background work
//!
//! # Example
//!
//! ```rust
//! use statecraft::builder::MachineDefinition;
//! use statecraft::core::GuardExpr;
//! use statecraft::simulate::simulate;
//! use statecraft::slots::SlotTable;
//! use statecraft::tagged_enum;
//!
//! tagged_enum! {
//!     pub enum Reading: ReadingTag {
//!         Idle { value: u32 },
//!         High,
//!         Medium,
//!         Low,
//!     }
//! }
//!
//! tagged_enum! {
//!     pub enum Command: CommandTag {
//!         Check,
//!     }
//! }
//!
//! fn value(state: &Reading) -> u32 {
//!     match state {
//!         Reading::Idle { value } => *value,
//!         _ => 0,
//!     }
//! }
//!
//! let machine = MachineDefinition::<Reading, Command, ()>::new(Reading::Idle { value: 50 })
//!     .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isHigh")
//!     .guard_slot(ReadingTag::Idle, Some(CommandTag::Check), "isMedium")
//!     .on_when(ReadingTag::Idle, CommandTag::Check, GuardExpr::slot("isHigh"), |_, _| {
//!         Reading::High
//!     })
//!     .on_when(ReadingTag::Idle, CommandTag::Check, GuardExpr::slot("isMedium"), |_, _| {
//!         Reading::Medium
//!     })
//!     .on(ReadingTag::Idle, CommandTag::Check, |_, _| Reading::Low)
//!     .build()
//!     .unwrap();
//!
//! let bindings = SlotTable::new()
//!     .guard_fn("isHigh", |s: &Reading, _: Option<&Command>| value(s) >= 70)
//!     .guard_fn("isMedium", |s: &Reading, _: Option<&Command>| value(s) >= 40)
//!     .bind(&machine, ())
//!     .unwrap();
//!
//! let events = vec![Command::Check];
//! let run = futures::executor::block_on(simulate(&machine, &bindings, events)).unwrap();
//! assert_eq!(run.final_state, Reading::Medium);
//! ```

pub mod actor;
pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod machine;
pub mod resolver;
pub mod simulate;
pub mod slots;

// Re-export commonly used types
pub use actor::{ActorBuilder, ActorConfig, ActorError, ActorHandle, ActorStatus, EffectContext};
pub use builder::{BuildError, ConfigError, MachineDefinition, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointSink, JsonCodec, StateCodec};
pub use core::{Guard, GuardExpr, Tagged, Trace, TraceStep};
pub use machine::Machine;
pub use resolver::{resolve, settle, Resolution, ResolveError};
pub use simulate::{simulate, SimulateError, Simulation};
pub use slots::{Bindings, SlotTable};
