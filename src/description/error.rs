//! Problems detected while validating a machine description.

use thiserror::Error;

/// A malformed description, detected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Initial state not specified. Call .initial(state) before creating a machine")]
    MissingInitialState,

    #[error("Action '{name}' is declared more than once")]
    DuplicateAction { name: String },

    #[error("Action '{action}' has no source states. Call .from(state)")]
    EmptySources { action: String },

    #[error("Action '{action}' has no destination states. Call .to(state)")]
    EmptyDestinations { action: String },

    #[error("Action '{action}' declares destination '{state}' more than once")]
    DuplicateDestination { action: String, state: String },

    #[error(
        "Action '{action}' has several destinations but neither it nor the description \
         defines an event callback to choose one"
    )]
    UnresolvableEvent { action: String },
}
