//! State labels for declaratively described machines.
//!
//! A machine state carries no structure beyond its identity. Anything that is
//! comparable, hashable and serializable can act as one by implementing [`State`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Trait for machine state labels.
///
/// # Required Traits
///
/// - `Clone`: states are copied into transition contexts and history
/// - `Eq` + `Hash`: source sets are hash sets, destinations are compared
/// - `Debug`: states appear in errors and logs
/// - `Serialize` + `DeserializeOwned`: states are checkpointed
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum Door {
///     Open,
///     Closed,
///     Locked,
/// }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Locked => "Locked",
///         }
///     }
/// }
///
/// assert_eq!(Door::Locked.name(), "Locked");
/// assert!(!Door::Locked.is_final());
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a terminal state.
    ///
    /// Purely informational: the engine never refuses an action because the
    /// current state is final. Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

/// Opaque string label identifying a state.
///
/// The default state type for machines whose states are only known at runtime.
///
/// ```rust
/// use declarative_fsm::core::{State, StateId};
///
/// let idle = StateId::from("idle");
/// assert_eq!(idle.name(), "idle");
/// assert_eq!(idle, StateId::new("idle"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl State for StateId {
    fn name(&self) -> &str {
        &self.0
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateId {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for StateId {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl PartialEq<str> for StateId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
