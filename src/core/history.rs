//! Log of committed transitions.
//!
//! Only transitions that actually advanced the machine are recorded. Aborted
//! or rejected invocations leave no trace here.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::{StateId, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: StateId::from("idle"),
///     to: StateId::from("running"),
///     action: "start".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.action, "start");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state the action fired from
    pub from: S,
    /// The state that was committed
    pub to: S,
    /// Name of the action that caused the transition
    pub action: String,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// Appending is amortized O(1): `push` extends the log in place and `record`
/// is its by-value form for building histories fluently.
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::{StateHistory, StateId, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: StateId::from("idle"),
///         to: StateId::from("running"),
///         action: "start".to_string(),
///         timestamp: Utc::now(),
///     })
///     .record(StateTransition {
///         from: StateId::from("running"),
///         to: StateId::from("stopped"),
///         action: "stop".to_string(),
///         timestamp: Utc::now(),
///     });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // idle -> running -> stopped
/// assert_eq!(history.actions(), vec!["start", "stop"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a transition.
    pub fn push(&mut self, transition: StateTransition<S>) {
        self.transitions.push(transition);
    }

    /// Append a transition and hand the history back.
    pub fn record(mut self, transition: StateTransition<S>) -> Self {
        self.push(transition);
        self
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the first transition followed by the `to`
    /// state of every transition. Empty when nothing was recorded.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Names of the actions that produced each transition, in order.
    pub fn actions(&self) -> Vec<&str> {
        self.transitions.iter().map(|t| t.action.as_str()).collect()
    }

    /// Duration between the first and last committed transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All recorded transitions, oldest first.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateId;

    fn transition(from: &str, to: &str, action: &str) -> StateTransition<StateId> {
        StateTransition {
            from: StateId::from(from),
            to: StateId::from(to),
            action: action.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<StateId> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn push_appends_in_place() {
        let mut history = StateHistory::new();
        history.push(transition("idle", "running", "start"));
        history.push(transition("running", "idle", "stop"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.transitions()[1].action, "stop");
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(transition("idle", "running", "start"))
            .record(transition("running", "idle", "stop"));

        let path = history.get_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], &StateId::from("idle"));
        assert_eq!(path[1], &StateId::from("running"));
        assert_eq!(path[2], &StateId::from("idle"));
    }

    #[test]
    fn actions_follow_record_order() {
        let history = StateHistory::new()
            .record(transition("a", "b", "first"))
            .record(transition("b", "c", "second"));

        assert_eq!(history.actions(), vec!["first", "second"]);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let history = StateHistory::new().record(transition("a", "b", "go"));

        std::thread::sleep(std::time::Duration::from_millis(10));

        let history = history.record(transition("b", "c", "go"));

        let duration = history.duration().unwrap();
        assert!(duration >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StateHistory::new().record(transition("idle", "running", "start"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<StateId> = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
