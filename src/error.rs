//! Crate-wide error type.

use crate::description::ConfigurationError;
use crate::engine::TransitionError;
use thiserror::Error;

/// Every failure a machine can report to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    /// The description is malformed. Lists every problem found.
    #[error("Invalid machine description: {}", join(.0))]
    Configuration(Vec<ConfigurationError>),

    /// The action name was never declared.
    #[error("Unknown action '{name}'")]
    UnknownAction { name: String },

    /// The action does not list the current state among its sources.
    #[error("Action '{action}' cannot fire from state '{state}'")]
    IllegalTransition { action: String, state: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

fn join(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
