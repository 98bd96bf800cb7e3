//! Why a checkpoint could not be written, read or resumed.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("could not encode checkpoint: {0}")]
    Encode(String),

    #[error("could not decode checkpoint: {0}")]
    Decode(String),

    #[error("checkpoint format {found} cannot be resumed, expected format {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The registry has no initial state, so no machine can run over it.
    #[error("registry has no initial state to resume against")]
    RegistryWithoutInitialState,

    #[error("checkpoint starts from '{checkpoint}' but the registry starts from '{registry}'")]
    InitialStateMismatch { checkpoint: String, registry: String },

    #[error("state '{state}' is not declared by the registry")]
    UndeclaredState { state: String },

    /// The recorded transitions do not explain the checkpointed current state.
    #[error("history does not lead to current state '{current}': {reason}")]
    InconsistentHistory { current: String, reason: String },
}
