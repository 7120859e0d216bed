//! Destinations for checkpoints taken by the runtime.

use crate::checkpoint::{Checkpoint, CheckpointError};
use parking_lot::Mutex;
use uuid::Uuid;

/// Receives checkpoints from a running actor.
///
/// Called from the actor's run loop right after a transition is applied,
/// so implementations should hand the checkpoint off rather than block.
pub trait CheckpointSink: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

/// In-memory sink keeping every checkpoint it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<Checkpoint>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent checkpoint for the actor, if any.
    pub fn latest(&self, actor: Uuid) -> Option<Checkpoint> {
        self.saved
            .lock()
            .iter()
            .rev()
            .find(|checkpoint| checkpoint.actor == actor)
            .cloned()
    }

    pub fn all(&self) -> Vec<Checkpoint> {
        self.saved.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.saved.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.lock().is_empty()
    }
}

impl CheckpointSink for MemorySink {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.saved.lock().push(checkpoint.clone());
        Ok(())
    }
}
