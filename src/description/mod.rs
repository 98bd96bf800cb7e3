//! Machine descriptions.
//!
//! A [`Description`] is assembled with builders and frozen into a
//! [`Registry`], which validates it once and then only answers lookups.
//!
//! # Example
//!
//! ```rust
//! use declarative_fsm::core::StateId;
//! use declarative_fsm::description::{ActionBuilder, Description, Registry};
//!
//! let description = Description::builder()
//!     .initial(StateId::from("draft"))
//!     .on_before(|ctx| {
//!         ctx.insert("audited", true);
//!         Ok(())
//!     })
//!     .action(ActionBuilder::new("submit").from("draft".into()).to("review".into()))
//!     .action(
//!         ActionBuilder::new("review")
//!             .from("review".into())
//!             .destinations(["published".into(), "draft".into()])
//!             .on_event(|ctx| {
//!                 let approved = ctx.kwarg_as::<bool>("approved").unwrap_or(false);
//!                 Ok(Some(StateId::from(if approved { "published" } else { "draft" })))
//!             }),
//!     )
//!     .build();
//!
//! let registry = Registry::new(description).unwrap();
//! assert_eq!(registry.action_names().collect::<Vec<_>>(), vec!["submit", "review"]);
//! ```

mod action;
mod callbacks;
mod error;
mod registry;

pub use action::{ActionBuilder, ActionDescriptor};
pub use callbacks::{Abort, Callback, CallbackSet, CallbackSlot, EventFn, HookFn};
pub use error::ConfigurationError;
pub use registry::{Description, DescriptionBuilder, Registry};
