//! Actor configuration.

use serde::{Deserialize, Serialize};

/// Per-actor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Name used in logs; defaults to the machine name when empty.
    #[serde(default)]
    pub name: String,

    /// Hand a checkpoint to the sink after every applied transition.
    /// Requires both a codec and a sink.
    #[serde(default)]
    pub checkpoint_after_transition: bool,
}

impl ActorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn checkpoint_after_transition(mut self, enabled: bool) -> Self {
        self.checkpoint_after_transition = enabled;
        self
    }
}
