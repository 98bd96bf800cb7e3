//! Core state types.
//!
//! - State labels via the `State` trait and the string-backed `StateId`
//! - The `state_enum!` macro for enum-typed states
//! - Append-only history of committed transitions

mod history;
mod macros;
mod state;

pub use history::{StateHistory, StateTransition};
pub use state::{State, StateId};
