//! Execution engine.
//!
//! A [`Machine`] owns the current state and runs the transition protocol for
//! each invoked action: source check, `before`, `event`, `after`, commit.
//! Callbacks see the invocation through a [`TransitionContext`].

mod action;
mod context;
mod error;
mod machine;

pub use action::Action;
pub use context::{Args, TransitionContext};
pub use error::TransitionError;
pub use machine::Machine;
