//! The machine description and its validated, read-only registry.

use crate::core::State;
use crate::description::action::{ActionBuilder, ActionDescriptor};
use crate::description::callbacks::{Abort, Callback, CallbackSet, CallbackSlot};
use crate::description::error::ConfigurationError;
use crate::engine::TransitionContext;
use crate::error::FsmError;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

/// Already-parsed machine description: initial state, ordered actions and
/// global callbacks. Nothing is checked until it becomes a [`Registry`].
#[derive(Clone, Debug)]
pub struct Description<S: State> {
    pub(crate) initial: Option<S>,
    pub(crate) actions: Vec<ActionDescriptor<S>>,
    pub(crate) callbacks: CallbackSet<S>,
}

impl<S: State> Description<S> {
    pub fn builder() -> DescriptionBuilder<S> {
        DescriptionBuilder::new()
    }
}

/// Builder for machine descriptions.
pub struct DescriptionBuilder<S: State> {
    initial: Option<S>,
    actions: Vec<ActionDescriptor<S>>,
    callbacks: CallbackSet<S>,
}

impl<S: State> DescriptionBuilder<S> {
    pub fn new() -> Self {
        Self {
            initial: None,
            actions: Vec::new(),
            callbacks: CallbackSet::new(),
        }
    }

    /// Set the initial state (required by machines, optional for registries).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Declare an action.
    pub fn action(mut self, builder: ActionBuilder<S>) -> Self {
        self.actions.push(builder.build());
        self
    }

    /// Declare several pre-built actions, keeping their order.
    pub fn actions(mut self, actions: impl IntoIterator<Item = ActionDescriptor<S>>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Replace the global callback set.
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

    pub fn build(self) -> Description<S> {
        Description {
            initial: self.initial,
            actions: self.actions,
            callbacks: self.callbacks,
        }
    }
}

impl<S: State> Default for DescriptionBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

type Check = Validation<(), NonEmptyVec<ConfigurationError>>;

/// Check every action, accumulating ALL configuration errors.
fn validate<S: State>(description: &Description<S>) -> Check {
    let mut checks: Vec<Check> = Vec::new();
    let mut seen = HashSet::new();
    let global_event = description.callbacks.contains(CallbackSlot::Event);

    for action in &description.actions {
        let name = action.name().to_string();

        checks.push(if seen.insert(action.name()) {
            Validation::success(())
        } else {
            Validation::fail(ConfigurationError::DuplicateAction { name: name.clone() })
        });

        if action.sources().is_empty() {
            checks.push(Validation::fail(ConfigurationError::EmptySources {
                action: name.clone(),
            }));
        }

        if action.destinations().is_empty() {
            checks.push(Validation::fail(ConfigurationError::EmptyDestinations {
                action: name.clone(),
            }));
        }

        let mut declared = HashSet::new();
        for state in action.destinations() {
            if !declared.insert(state) {
                checks.push(Validation::fail(ConfigurationError::DuplicateDestination {
                    action: name.clone(),
                    state: state.name().to_string(),
                }));
            }
        }

        if action.is_ambiguous()
            && !action.callbacks().contains(CallbackSlot::Event)
            && !global_event
        {
            checks.push(Validation::fail(ConfigurationError::UnresolvableEvent {
                action: name,
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Validated, immutable view of a description.
///
/// A registry is never mutated after construction, so one instance can be
/// shared (behind an `Arc`) by any number of machines and threads.
///
/// # Example
///
/// ```rust
/// use declarative_fsm::core::StateId;
/// use declarative_fsm::description::{ActionBuilder, Description, Registry};
///
/// let registry = Registry::new(
///     Description::builder()
///         .initial(StateId::from("idle"))
///         .action(ActionBuilder::new("start").from("idle".into()).to("running".into()))
///         .build(),
/// )
/// .unwrap();
///
/// assert_eq!(registry.initial_state().unwrap(), &StateId::from("idle"));
/// assert!(registry.action_descriptor("start").is_ok());
/// assert!(registry.action_descriptor("stop").is_err());
/// ```
#[derive(Debug)]
pub struct Registry<S: State> {
    initial: Option<S>,
    actions: Vec<ActionDescriptor<S>>,
    index: HashMap<String, usize>,
    callbacks: CallbackSet<S>,
}

impl<S: State> Registry<S> {
    /// Validate `description` and freeze it.
    ///
    /// Fails with [`FsmError::Configuration`] listing every problem found:
    /// duplicate action names, empty source or destination sets, repeated
    /// destinations, and
    /// ambiguous actions with no event callback at either scope. A missing
    /// initial state is not an error here; see [`Registry::initial_state`].
    pub fn new(description: Description<S>) -> Result<Self, FsmError> {
        if let Validation::Failure(errors) = validate(&description) {
            return Err(FsmError::Configuration(errors.iter().cloned().collect()));
        }

        let index = description
            .actions
            .iter()
            .enumerate()
            .map(|(position, action)| (action.name().to_string(), position))
            .collect();

        debug!(
            actions = description.actions.len(),
            "registered machine description"
        );

        Ok(Self {
            initial: description.initial,
            actions: description.actions,
            index,
            callbacks: description.callbacks,
        })
    }

    /// The configured initial state.
    pub fn initial_state(&self) -> Result<&S, FsmError> {
        self.initial
            .as_ref()
            .ok_or_else(|| FsmError::Configuration(vec![ConfigurationError::MissingInitialState]))
    }

    /// Look up a declared action by name.
    pub fn action_descriptor(&self, name: &str) -> Result<&ActionDescriptor<S>, FsmError> {
        self.index
            .get(name)
            .map(|position| &self.actions[*position])
            .ok_or_else(|| FsmError::UnknownAction {
                name: name.to_string(),
            })
    }

    /// The global callback in `slot`, if any.
    pub fn global_callback(&self, slot: CallbackSlot) -> Option<Callback<S>> {
        self.callbacks.get(slot)
    }

    pub fn global_callbacks(&self) -> &CallbackSet<S> {
        &self.callbacks
    }

    /// Declared actions, in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = &ActionDescriptor<S>> {
        self.actions.iter()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|action| action.name())
    }

    /// Whether `state` is mentioned anywhere: as the initial state, a source
    /// or a destination.
    pub fn contains_state(&self, state: &S) -> bool {
        self.initial.as_ref() == Some(state)
            || self
                .actions
                .iter()
                .any(|action| action.allows_from(state) || action.declares_destination(state))
    }
}
