//! Declared actions and the builder that produces them.

use crate::core::State;
use crate::description::callbacks::{Abort, CallbackSet};
use crate::engine::TransitionContext;
use std::collections::HashSet;

/// One declared action: where it may fire from, where it may lead, and its
/// own callback overrides.
///
/// Descriptors are only produced by [`ActionBuilder`]; they are validated as a
/// whole when a [`Registry`](crate::description::Registry) is created.
#[derive(Clone, Debug)]
pub struct ActionDescriptor<S: State> {
    name: String,
    sources: HashSet<S>,
    destinations: Vec<S>,
    callbacks: CallbackSet<S>,
}

impl<S: State> ActionDescriptor<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &HashSet<S> {
        &self.sources
    }

    /// Declared destinations, in declaration order.
    pub fn destinations(&self) -> &[S] {
        &self.destinations
    }

    /// Per-action callback overrides.
    pub fn callbacks(&self) -> &CallbackSet<S> {
        &self.callbacks
    }

    /// True when the event callback must pick among several destinations.
    pub fn is_ambiguous(&self) -> bool {
        self.destinations.len() > 1
    }

    pub fn allows_from(&self, state: &S) -> bool {
        self.sources.contains(state)
    }

    pub fn declares_destination(&self, state: &S) -> bool {
        self.destinations.contains(state)
    }

    /// Callbacks that apply to this action: its own, slot by slot, falling
    /// back to `global`.
    pub fn resolve(&self, global: &CallbackSet<S>) -> CallbackSet<S> {
        self.callbacks.or(global)
    }
}

/// Builder for a single action.
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::StateId;
/// use declarative_fsm::description::ActionBuilder;
///
/// let action = ActionBuilder::<StateId>::new("decide")
///     .from("review".into())
///     .to("approved".into())
///     .to("rejected".into())
///     .on_event(|_ctx| Ok(Some(StateId::from("approved"))))
///     .build();
///
/// assert!(action.is_ambiguous());
/// assert!(action.allows_from(&StateId::from("review")));
/// ```
pub struct ActionBuilder<S: State> {
    name: String,
    sources: HashSet<S>,
    destinations: Vec<S>,
    callbacks: CallbackSet<S>,
}

impl<S: State> ActionBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: HashSet::new(),
            destinations: Vec::new(),
            callbacks: CallbackSet::new(),
        }
    }

    /// Add a source state.
    pub fn from(mut self, state: S) -> Self {
        self.sources.insert(state);
        self
    }

    /// Add several source states.
    pub fn sources(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.sources.extend(states);
        self
    }

    /// Add a destination state.
    ///
    /// Destinations are kept exactly as declared; a repeated destination is
    /// rejected when the registry is created.
    pub fn to(mut self, state: S) -> Self {
        self.destinations.push(state);
        self
    }

    /// Add several destination states, keeping their order.
    pub fn destinations(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.destinations.extend(states);
        self
    }

    /// Replace the whole per-action callback set.
    pub fn callbacks(mut self, callbacks: CallbackSet<S>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn on_before<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<(), Abort> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_before(callback);
        self
    }

    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<Option<S>, Abort> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_event(callback);
        self
    }

    pub fn on_after<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<(), Abort> + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_after(callback);
        self
    }

    /// Build the descriptor. Structural problems are reported later, by
    /// [`Registry::new`](crate::description::Registry::new), all at once.
    pub fn build(self) -> ActionDescriptor<S> {
        ActionDescriptor {
            name: self.name,
            sources: self.sources,
            destinations: self.destinations,
            callbacks: self.callbacks,
        }
    }
}
