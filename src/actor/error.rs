//! Actor error types.

use crate::builder::BuildError;
use crate::checkpoint::CheckpointError;
use crate::resolver::ResolveError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ActorError {
    /// The actor has stopped or failed and accepts no more events
    #[error("Actor {0} is not running")]
    NotRunning(Uuid),

    /// Resolution failed while starting the actor
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The bindings do not implement every slot the machine declares
    #[error(transparent)]
    Config(#[from] BuildError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
