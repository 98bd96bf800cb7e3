//! Declarative FSM: a finite state machine interpreter driven by a description.
//!
//! A machine is described as data: an initial state, a list of named actions
//! (each legal from a set of source states and leading to one or more
//! destinations) and optional `before` / `event` / `after` callbacks, declared
//! globally or per action. The engine runs one action at a time and either
//! commits the new state or leaves the machine exactly where it was.
//!
//! # Core Concepts
//!
//! - **State**: any comparable, hashable, serializable label (`StateId` or an enum)
//! - **Registry**: the validated, immutable description
//! - **Machine**: owns the current state and executes the transition protocol
//! - **Callbacks**: per-action callbacks shadow global ones, slot by slot
//! - **Checkpoint**: serializable snapshot of a running machine
//!
//! # Example
//!
//! ```rust
//! use declarative_fsm::prelude::*;
//!
//! let machine = Machine::create(
//!     Description::builder()
//!         .initial(StateId::from("A"))
//!         .action(
//!             ActionBuilder::new("decide")
//!                 .from("A".into())
//!                 .destinations(["B".into(), "C".into()])
//!                 .on_event(|ctx| {
//!                     let flag = ctx.kwarg_as::<bool>("flag").unwrap_or(false);
//!                     Ok(Some(StateId::from(if flag { "B" } else { "C" })))
//!                 }),
//!         )
//!         .build(),
//! )
//! .unwrap();
//!
//! machine.fire("decide", Args::new().kwarg("flag", true)).unwrap();
//! assert_eq!(machine.current_state(), StateId::from("B"));
//! ```

pub mod checkpoint;
pub mod core;
pub mod description;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use crate::core::{State, StateHistory, StateId, StateTransition};
pub use crate::description::{
    Abort, ActionBuilder, ActionDescriptor, CallbackSet, CallbackSlot, ConfigurationError,
    Description, Registry,
};
pub use crate::engine::{Action, Args, Machine, TransitionContext, TransitionError};
pub use crate::error::FsmError;

/// Everything needed to describe and run a machine.
pub mod prelude {
    pub use crate::core::{State, StateId};
    pub use crate::description::{
        Abort, ActionBuilder, CallbackSet, CallbackSlot, Description, Registry,
    };
    pub use crate::engine::{Args, Machine, TransitionContext, TransitionError};
    pub use crate::error::FsmError;
}
