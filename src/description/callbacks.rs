//! Lifecycle callbacks and their precedence rules.
//!
//! Callbacks attach at two scopes: globally on the description, and per action.
//! For every slot the per-action callback, when present, shadows the global one.
//! Slots are resolved independently, so an action may override `event` while
//! still inheriting the global `before`.

use crate::core::State;
use crate::engine::TransitionContext;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Extension point in the transition protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackSlot {
    /// Runs before the destination is decided; may abort.
    Before,
    /// Computes or confirms the destination.
    Event,
    /// Runs once the destination is known, before commit; may abort.
    After,
}

impl CallbackSlot {
    pub const ALL: [CallbackSlot; 3] = [Self::Before, Self::Event, Self::After];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Event => "event",
            Self::After => "after",
        }
    }
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal returned by a callback to cancel the pending transition.
///
/// The machine stays in the state it was in before the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Abort {
    reason: String,
}

impl Abort {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Callback type for the `before` and `after` slots.
pub type HookFn<S> =
    Arc<dyn Fn(&mut TransitionContext<S>) -> Result<(), Abort> + Send + Sync + 'static>;

/// Callback type for the `event` slot.
///
/// `Ok(Some(state))` names a destination, `Ok(None)` expresses no opinion.
/// Single-destination actions ignore the outcome entirely.
pub type EventFn<S> =
    Arc<dyn Fn(&mut TransitionContext<S>) -> Result<Option<S>, Abort> + Send + Sync + 'static>;

/// A callback looked up by slot.
pub enum Callback<S: State> {
    Hook(HookFn<S>),
    Event(EventFn<S>),
}

impl<S: State> Clone for Callback<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Hook(f) => Self::Hook(Arc::clone(f)),
            Self::Event(f) => Self::Event(Arc::clone(f)),
        }
    }
}

impl<S: State> fmt::Debug for Callback<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hook(_) => f.write_str("Callback::Hook(..)"),
            Self::Event(_) => f.write_str("Callback::Event(..)"),
        }
    }
}

/// At most one callback per slot.
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::StateId;
/// use declarative_fsm::description::{CallbackSet, CallbackSlot};
///
/// let callbacks: CallbackSet<StateId> = CallbackSet::new()
///     .on_before(|_ctx| Ok(()))
///     .on_event(|_ctx| Ok(Some(StateId::from("done"))));
///
/// assert!(callbacks.contains(CallbackSlot::Before));
/// assert!(callbacks.contains(CallbackSlot::Event));
/// assert!(!callbacks.contains(CallbackSlot::After));
/// ```
pub struct CallbackSet<S: State> {
    before: Option<HookFn<S>>,
    event: Option<EventFn<S>>,
    after: Option<HookFn<S>>,
}

impl<S: State> CallbackSet<S> {
    pub fn new() -> Self {
        Self {
            before: None,
            event: None,
            after: None,
        }
    }

    /// Set the `before` callback, replacing any previous one.
    pub fn on_before<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<(), Abort> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(callback));
        self
    }

    /// Set the `event` callback, replacing any previous one.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<Option<S>, Abort> + Send + Sync + 'static,
    {
        self.event = Some(Arc::new(callback));
        self
    }

    /// Set the `after` callback, replacing any previous one.
    pub fn on_after<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut TransitionContext<S>) -> Result<(), Abort> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(callback));
        self
    }

    pub fn before(&self) -> Option<&HookFn<S>> {
        self.before.as_ref()
    }

    pub fn event(&self) -> Option<&EventFn<S>> {
        self.event.as_ref()
    }

    pub fn after(&self) -> Option<&HookFn<S>> {
        self.after.as_ref()
    }

    /// Look up the callback held in `slot`.
    pub fn get(&self, slot: CallbackSlot) -> Option<Callback<S>> {
        match slot {
            CallbackSlot::Before => self.before.clone().map(Callback::Hook),
            CallbackSlot::Event => self.event.clone().map(Callback::Event),
            CallbackSlot::After => self.after.clone().map(Callback::Hook),
        }
    }

    pub fn contains(&self, slot: CallbackSlot) -> bool {
        match slot {
            CallbackSlot::Before => self.before.is_some(),
            CallbackSlot::Event => self.event.is_some(),
            CallbackSlot::After => self.after.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        CallbackSlot::ALL.iter().all(|slot| !self.contains(*slot))
    }

    /// Resolve each slot against `fallback`: own callback first, then the fallback's.
    pub fn or(&self, fallback: &CallbackSet<S>) -> CallbackSet<S> {
        CallbackSet {
            before: self.before.clone().or_else(|| fallback.before.clone()),
            event: self.event.clone().or_else(|| fallback.event.clone()),
            after: self.after.clone().or_else(|| fallback.after.clone()),
        }
    }
}

impl<S: State> Default for CallbackSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> Clone for CallbackSet<S> {
    fn clone(&self) -> Self {
        Self {
            before: self.before.clone(),
            event: self.event.clone(),
            after: self.after.clone(),
        }
    }
}

impl<S: State> fmt::Debug for CallbackSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSet")
            .field("before", &self.before.is_some())
            .field("event", &self.event.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}
