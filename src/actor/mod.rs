//! Actor runtime: one serialized run loop per machine instance.
//!
//! # Key Concepts
//!
//! - **Mailbox**: commands are processed strictly in arrival order; the
//!   next one starts only after the current event, its effects and its
//!   always-cascade are done
//! - **Effects**: exit effects of the vacated state run before entry
//!   effects of the new one; same-tag transitions skip both unless forced
//! - **Delay timer**: at most one per actor, armed on entering a state
//!   with a delay and cancelled on leaving it
//! - **State scope**: background work spawned by an effect is aborted
//!   when its state is exited
//!
//! Actors are tokio tasks; spawning requires a running tokio runtime.

mod config;
mod context;
mod error;
mod handle;
mod runtime;
mod scope;
mod timer;

pub use config::ActorConfig;
pub use context::{EffectContext, Mailbox};
pub use error::ActorError;
pub use handle::{ActorHandle, ActorStatus, Subscription};
pub use runtime::{spawn, ActorBuilder};
pub use scope::ScopeToken;
