//! Checkpoint and restore of actor state.
//!
//! A checkpoint carries the encoded current state of one actor together
//! with enough metadata to restore it into a fresh actor of the same
//! machine. Handlers, timers and background work are not serializable and
//! are re-established by the entry effects of the restored state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod codec;
pub mod error;
pub mod sink;

pub use codec::{BincodeCodec, JsonCodec, StateCodec};
pub use error::CheckpointError;
pub use sink::{CheckpointSink, MemorySink};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of one actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Identifier of the actor the state was taken from
    pub actor: Uuid,

    /// Name of the machine the actor runs
    pub machine: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Current state, encoded with the actor's codec
    pub state: Vec<u8>,
}

impl Checkpoint {
    /// Encode `state` into a new checkpoint.
    pub fn capture<S>(
        actor: Uuid,
        machine: impl Into<String>,
        state: &S,
        codec: &dyn StateCodec<S>,
    ) -> Result<Self, CheckpointError> {
        Ok(Self {
            version: CHECKPOINT_VERSION,
            actor,
            machine: machine.into(),
            timestamp: Utc::now(),
            state: codec.encode(state)?,
        })
    }

    /// Decode the stored state.
    pub fn decode<S>(&self, codec: &dyn StateCodec<S>) -> Result<S, CheckpointError> {
        codec.decode(&self.state)
    }

    /// Fail unless the checkpoint was taken from the named machine.
    pub fn ensure_machine(&self, machine: &str) -> Result<(), CheckpointError> {
        if self.machine == machine {
            Ok(())
        } else {
            Err(CheckpointError::MachineMismatch {
                expected: machine.to_string(),
                found: self.machine.clone(),
            })
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.supported()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.supported()
    }

    fn supported(self) -> Result<Self, CheckpointError> {
        if self.version > CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}
