//! Checkpoint and resume for running machines.
//!
//! A checkpoint captures what a machine has done: its initial and current
//! state, plus the committed history when the machine records one. Callbacks and action declarations are
//! not serializable; a checkpoint is resumed against a registry built from
//! the same description.
//!
//! # Example
//!
//! ```rust
//! use declarative_fsm::checkpoint::Checkpoint;
//! use declarative_fsm::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(
//!     Registry::new(
//!         Description::builder()
//!             .initial(StateId::from("idle"))
//!             .action(ActionBuilder::new("start").from("idle".into()).to("running".into()))
//!             .build(),
//!     )
//!     .unwrap(),
//! );
//!
//! let machine = Machine::with_registry(Arc::clone(&registry)).unwrap();
//! machine.fire("start", Args::new()).unwrap();
//!
//! let json = machine.checkpoint().to_json().unwrap();
//! let restored = Machine::resume(registry, Checkpoint::from_json(&json).unwrap()).unwrap();
//! assert_eq!(restored.current_state(), StateId::from("running"));
//! ```

use crate::core::{State, StateHistory};
use crate::description::Registry;
use crate::engine::Machine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine's runtime state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Checkpoint<S: State> {
    /// Checkpoint format version
    pub version: u32,

    pub id: String,

    pub timestamp: DateTime<Utc>,

    /// Initial state of the registry the machine ran over
    pub initial_state: S,

    pub current_state: S,

    /// Committed transitions, present only for machines that record them
    #[serde(default)]
    pub history: Option<StateHistory<S>>,
}

impl<S: State> Checkpoint<S> {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::Decode(e.to_string()))
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode(e.to_string()))
    }

    /// Check that this checkpoint can be resumed against `registry`.
    ///
    /// The initial state must be the registry's, and the current state must
    /// be declared by it. When a history is present it must be a connected
    /// walk from the initial state to the current one; an empty history
    /// means the machine never left its initial state.
    pub fn validate(&self, registry: &Registry<S>) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let initial = registry
            .initial_state()
            .map_err(|_| CheckpointError::RegistryWithoutInitialState)?;
        if &self.initial_state != initial {
            return Err(CheckpointError::InitialStateMismatch {
                checkpoint: self.initial_state.name().to_string(),
                registry: initial.name().to_string(),
            });
        }

        if !registry.contains_state(&self.current_state) {
            return Err(CheckpointError::UndeclaredState {
                state: self.current_state.name().to_string(),
            });
        }

        match &self.history {
            Some(history) => self.validate_history(history),
            None => Ok(()),
        }
    }

    fn validate_history(&self, history: &StateHistory<S>) -> Result<(), CheckpointError> {
        let inconsistent = |reason: String| CheckpointError::InconsistentHistory {
            current: self.current_state.name().to_string(),
            reason,
        };

        let transitions = history.transitions();
        let (Some(first), Some(last)) = (transitions.first(), transitions.last()) else {
            if self.current_state != self.initial_state {
                return Err(inconsistent(format!(
                    "no transitions recorded since '{}'",
                    self.initial_state.name()
                )));
            }
            return Ok(());
        };

        if first.from != self.initial_state {
            return Err(inconsistent(format!(
                "first transition leaves '{}', not the initial state",
                first.from.name()
            )));
        }

        if let Some(pair) = transitions.windows(2).find(|pair| pair[0].to != pair[1].from) {
            return Err(inconsistent(format!(
                "'{}' ends in '{}' but '{}' leaves '{}'",
                pair[0].action,
                pair[0].to.name(),
                pair[1].action,
                pair[1].from.name()
            )));
        }

        if last.to != self.current_state {
            return Err(inconsistent(format!("last transition ends in '{}'", last.to.name())));
        }

        Ok(())
    }
}

impl<S: State> Machine<S> {
    /// Capture the machine's current runtime state.
    pub fn checkpoint(&self) -> Checkpoint<S> {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            initial_state: self.initial_state().clone(),
            current_state: self.current_state(),
            history: self.history(),
        }
    }

    /// Rebuild a machine from `checkpoint` over `registry`.
    ///
    /// The resumed machine records transitions exactly when the checkpointed
    /// one did.
    pub fn resume(
        registry: Arc<Registry<S>>,
        checkpoint: Checkpoint<S>,
    ) -> Result<Self, CheckpointError> {
        checkpoint.validate(&registry)?;

        info!(
            checkpoint = %checkpoint.id,
            state = checkpoint.current_state.name(),
            recording = checkpoint.history.is_some(),
            "machine resumed"
        );

        Ok(Machine::restore(
            registry,
            checkpoint.initial_state,
            checkpoint.current_state,
            checkpoint.history,
        ))
    }
}
