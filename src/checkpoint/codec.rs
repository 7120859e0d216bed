//! State codecs used by checkpoints.

use crate::checkpoint::CheckpointError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes and decodes machine states for persistence.
///
/// A machine runs without a codec; one is only required when a checkpoint
/// is taken or restored.
pub trait StateCodec<S>: Send + Sync {
    fn encode(&self, state: &S) -> Result<Vec<u8>, CheckpointError>;

    fn decode(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// Human-readable codec backed by `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<S> StateCodec<S> for JsonCodec
where
    S: Serialize + DeserializeOwned,
{
    fn encode(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(state).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

/// Compact binary codec backed by `bincode`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl<S> StateCodec<S> for BincodeCodec
where
    S: Serialize + DeserializeOwned,
{
    fn encode(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(state).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}
