//! Per-invocation context handed to callbacks.

use crate::core::State;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Positional and keyword arguments of one action invocation.
///
/// ```rust
/// use declarative_fsm::engine::Args;
///
/// let args = Args::new().arg(42).kwarg("flag", true);
/// assert_eq!(args.positional().len(), 1);
/// assert_eq!(args.named()["flag"], true);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument, replacing an earlier one with the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }
}

/// Context for a single action invocation.
///
/// Built before any callback runs and dropped when the invocation returns.
/// The source state and action name are fixed; callbacks communicate with
/// later phases through [`insert`](Self::insert) / [`get`](Self::get).
#[derive(Clone, Debug)]
pub struct TransitionContext<S: State> {
    source: S,
    action: String,
    args: Args,
    destination: Option<S>,
    extensions: Map<String, Value>,
    started_at: DateTime<Utc>,
}

impl<S: State> TransitionContext<S> {
    pub(crate) fn new(source: S, action: impl Into<String>, args: Args) -> Self {
        Self {
            source,
            action: action.into(),
            args,
            destination: None,
            extensions: Map::new(),
            started_at: Utc::now(),
        }
    }

    /// State the machine was in when the action was invoked.
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Positional argument at `index`.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.positional.get(index)
    }

    /// Keyword argument `name`.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.args.named.get(name)
    }

    /// Keyword argument `name` decoded into `T`. `None` if absent or mistyped.
    pub fn kwarg_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.kwarg(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Destination chosen for this invocation. Set once the event phase has
    /// completed, so only the `after` callback observes it.
    pub fn destination(&self) -> Option<&S> {
        self.destination.as_ref()
    }

    pub(crate) fn set_destination(&mut self, destination: S) {
        self.destination = Some(destination);
    }

    /// Attach a value for later callbacks of the same invocation.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.extensions.insert(key.into(), value.into())
    }

    /// Read a value attached by an earlier callback.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the invocation started.
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
