//! Callable handles for declared actions.

use crate::core::State;
use crate::description::ActionDescriptor;
use crate::engine::context::Args;
use crate::engine::machine::Machine;
use crate::error::FsmError;
use std::fmt;

/// One declared action bound to the machine that runs it.
///
/// ```rust
/// use declarative_fsm::prelude::*;
///
/// let machine = Machine::create(
///     Description::builder()
///         .initial(StateId::from("idle"))
///         .action(ActionBuilder::new("start").from("idle".into()).to("running".into()))
///         .build(),
/// )
/// .unwrap();
///
/// let start = machine.action("start").unwrap();
/// assert!(start.is_available());
/// start.call().unwrap();
/// assert!(!start.is_available());
/// ```
pub struct Action<'m, S: State> {
    machine: &'m Machine<S>,
    descriptor: &'m ActionDescriptor<S>,
}

impl<'m, S: State> Action<'m, S> {
    pub(crate) fn new(machine: &'m Machine<S>, descriptor: &'m ActionDescriptor<S>) -> Self {
        Self {
            machine,
            descriptor,
        }
    }

    pub fn name(&self) -> &'m str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &'m ActionDescriptor<S> {
        self.descriptor
    }

    /// Whether the machine's current state is one of this action's sources.
    pub fn is_available(&self) -> bool {
        self.descriptor.allows_from(&self.machine.current_state())
    }

    /// Run the action with `args`.
    pub fn invoke(&self, args: Args) -> Result<(), FsmError> {
        self.machine.run(self.descriptor, args)
    }

    /// Run the action without arguments.
    pub fn call(&self) -> Result<(), FsmError> {
        self.invoke(Args::new())
    }
}

impl<S: State> Clone for Action<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: State> Copy for Action<'_, S> {}

impl<S: State> fmt::Debug for Action<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.descriptor.name())
            .field("sources", self.descriptor.sources())
            .field("destinations", &self.descriptor.destinations())
            .finish()
    }
}
