//! Failures of the transition protocol itself.

use crate::description::CallbackSlot;
use thiserror::Error;

/// Runtime failure while executing an action. The machine state is left
/// exactly as it was before the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("No resolvable event handler for ambiguous action '{action}'")]
    MissingEventHandler { action: String },

    #[error("Event handler for '{action}' returned undeclared destination '{returned}'")]
    UndeclaredDestination { action: String, returned: String },

    #[error("Event handler for ambiguous action '{action}' chose no destination")]
    NoDestination { action: String },

    #[error("Action '{action}' aborted by {slot} callback: {reason}")]
    Aborted {
        action: String,
        slot: CallbackSlot,
        reason: String,
    },
}

impl TransitionError {
    /// Whether a callback cancelled the transition, as opposed to a
    /// misconfigured event handler.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}
