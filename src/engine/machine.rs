//! Machine that executes declared actions.

use crate::core::{State, StateHistory, StateTransition};
use crate::description::{Abort, ActionDescriptor, CallbackSlot, Description, EventFn, Registry};
use crate::engine::action::Action;
use crate::engine::context::{Args, TransitionContext};
use crate::engine::error::TransitionError;
use crate::error::FsmError;
use chrono::Utc;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A running state machine.
///
/// The current state is the only durable mutable data. It changes only when
/// an invocation completes every phase without being aborted:
///
/// 1. the current state must be one of the action's sources
/// 2. `before` runs and may abort
/// 3. `event` runs; for ambiguous actions it picks the destination
/// 4. `after` runs and may abort
/// 5. the destination is committed
///
/// Each invocation holds the machine's lock from step 1 to step 5, so
/// concurrent callers are serialized. The lock is not reentrant: a callback
/// that calls [`fire`](Machine::fire), [`current_state`](Machine::current_state),
/// [`is_final`](Machine::is_final), [`can`](Machine::can) or
/// [`available_actions`](Machine::available_actions) on the machine running it
/// deadlocks. The state being left is available as
/// [`TransitionContext::source`] instead. [`history`](Machine::history) and
/// the `Debug` output never wait for a running invocation.
///
/// A machine keeps no transition log unless [`with_history`](Machine::with_history)
/// turns one on.
///
/// # Example
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
/// machine.fire("start", Args::new()).unwrap();
/// assert_eq!(machine.current_state(), StateId::from("running"));
///
/// let err = machine.fire("start", Args::new()).unwrap_err();
/// assert!(matches!(err, FsmError::IllegalTransition { .. }));
/// ```
pub struct Machine<S: State> {
    registry: Arc<Registry<S>>,
    initial: S,
    current: Mutex<S>,
    history: Option<Mutex<StateHistory<S>>>,
}

impl<S: State> Machine<S> {
    /// Validate `description` and start a machine in its initial state.
    pub fn create(description: Description<S>) -> Result<Self, FsmError> {
        let registry = Registry::new(description)?;
        Self::with_registry(Arc::new(registry))
    }

    /// Start a machine over an existing registry, which may be shared with
    /// other machines.
    pub fn with_registry(registry: Arc<Registry<S>>) -> Result<Self, FsmError> {
        let initial = registry.initial_state()?.clone();
        info!(initial = initial.name(), "machine created");

        Ok(Self::restore(registry, initial.clone(), initial, None))
    }

    pub(crate) fn restore(
        registry: Arc<Registry<S>>,
        initial: S,
        current: S,
        history: Option<StateHistory<S>>,
    ) -> Self {
        Self {
            registry,
            initial,
            current: Mutex::new(current),
            history: history.map(Mutex::new),
        }
    }

    /// Record every committed transition from now on.
    ///
    /// Each commit appends one entry, so the log grows with the number of
    /// transitions. Calling this on a machine that already records is a no-op.
    pub fn with_history(mut self) -> Self {
        if self.history.is_none() {
            self.history = Some(Mutex::new(StateHistory::new()));
        }
        self
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    pub fn current_state(&self) -> S {
        self.current.lock().clone()
    }

    pub fn is_final(&self) -> bool {
        self.current.lock().is_final()
    }

    /// Committed transitions so far, or `None` when the machine does not
    /// record them.
    pub fn history(&self) -> Option<StateHistory<S>> {
        self.history.as_ref().map(|history| history.lock().clone())
    }

    pub fn is_recording(&self) -> bool {
        self.history.is_some()
    }

    /// Whether `action` is declared and lists the current state as a source.
    pub fn can(&self, action: &str) -> bool {
        let current = self.current_state();
        self.registry
            .action_descriptor(action)
            .is_ok_and(|descriptor| descriptor.allows_from(&current))
    }

    /// Names of the actions that may fire from the current state, in
    /// declaration order.
    pub fn available_actions(&self) -> Vec<String> {
        let current = self.current_state();
        self.registry
            .actions()
            .filter(|descriptor| descriptor.allows_from(&current))
            .map(|descriptor| descriptor.name().to_string())
            .collect()
    }

    /// Handle for the action `name`.
    pub fn action(&self, name: &str) -> Result<Action<'_, S>, FsmError> {
        let descriptor = self.registry.action_descriptor(name)?;
        Ok(Action::new(self, descriptor))
    }

    /// Handles for every declared action, in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = Action<'_, S>> {
        self.registry
            .actions()
            .map(move |descriptor| Action::new(self, descriptor))
    }

/// Invoke the action `name` with `args`.
    pub fn fire(&self, name: &str, args: Args) -> Result<(), FsmError> {
        let descriptor = self.registry.action_descriptor(name)?;
        self.run(descriptor, args)
    }

    /// Execute the transition protocol for `descriptor`.
    pub(crate) fn run(&self, descriptor: &ActionDescriptor<S>, args: Args) -> Result<(), FsmError> {
        let mut current = self.current.lock();
        let source = current.clone();
        let action = descriptor.name();

        debug!(action, state = source.name(), "invoking action");

        if !descriptor.allows_from(&source) {
            debug!(action, state = source.name(), "action not allowed from current state");
            return Err(FsmError::IllegalTransition {
                action: action.to_string(),
                state: source.name().to_string(),
            });
        }

        let mut context = TransitionContext::new(source.clone(), action, args);
        let callbacks = descriptor.resolve(self.registry.global_callbacks());

        if let Some(before) = callbacks.before() {
            trace!(action, "running before callback");
            before(&mut context).map_err(|abort| aborted(action, CallbackSlot::Before, abort))?;
        }

        let destination = select_destination(descriptor, callbacks.event(), &mut context)?;
        context.set_destination(destination.clone());

        if let Some(after) = callbacks.after() {
            trace!(action, destination = destination.name(), "running after callback");
            after(&mut context).map_err(|abort| aborted(action, CallbackSlot::After, abort))?;
        }

        if let Some(history) = &self.history {
            history.lock().push(StateTransition {
                from: source.clone(),
                to: destination.clone(),
                action: action.to_string(),
                timestamp: Utc::now(),
            });
        }
        *current = destination;

        debug!(
            action,
            from = source.name(),
            to = current.name(),
            elapsed_us = context.elapsed().as_micros() as u64,
            "transition committed"
        );
        Ok(())
    }
}

/// Run the event phase and decide where the action leads.
///
/// A single declared destination always wins: the event callback still runs,
/// but neither its return value nor an abort from it changes the outcome.
fn select_destination<S: State>(
    descriptor: &ActionDescriptor<S>,
    event: Option<&EventFn<S>>,
    context: &mut TransitionContext<S>,
) -> Result<S, TransitionError> {
    let action = descriptor.name();

    if let [destination] = descriptor.destinations() {
        if let Some(event) = event {
            trace!(action, "running event callback");
            match event(context) {
                Ok(Some(returned)) if &returned != destination => trace!(
                    action,
                    returned = returned.name(),
                    "event result ignored for single-destination action"
                ),
                Err(abort) => warn!(
                    action,
                    reason = abort.reason(),
                    "event abort ignored for single-destination action"
                ),
                Ok(_) => {}
            }
        }
        return Ok(destination.clone());
    }

    let event = event.ok_or_else(|| TransitionError::MissingEventHandler {
        action: action.to_string(),
    })?;

    trace!(action, "running event callback");
    match event(context) {
        Ok(Some(returned)) if descriptor.declares_destination(&returned) => Ok(returned),
        Ok(Some(returned)) => {
            warn!(
                action,
                returned = returned.name(),
                "event handler returned undeclared destination"
            );
            Err(TransitionError::UndeclaredDestination {
                action: action.to_string(),
                returned: returned.name().to_string(),
            })
        }
        Ok(None) => Err(TransitionError::NoDestination {
            action: action.to_string(),
        }),
        Err(abort) => Err(aborted(action, CallbackSlot::Event, abort)),
    }
}

fn aborted(action: &str, slot: CallbackSlot, abort: Abort) -> TransitionError {
    warn!(action, %slot, reason = abort.reason(), "transition aborted");
    TransitionError::Aborted {
        action: action.to_string(),
        slot,
        reason: abort.reason().to_string(),
    }
}

impl<S: State> fmt::Debug for Machine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Machine");
        debug.field("initial", &self.initial);
        match self.current.try_lock() {
            Some(current) => debug.field("current", &*current),
            None => debug.field("current", &format_args!("<transition in progress>")),
        };
        debug
            .field("actions", &self.registry.action_names().collect::<Vec<_>>())
            .field("recording", &self.is_recording())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateId;
    use crate::description::ActionBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(label: &str) -> StateId {
        StateId::from(label)
    }

    fn start_stop() -> Machine<StateId> {
        Machine::create(
            Description::builder()
                .initial(id("idle"))
                .action(ActionBuilder::new("start").from(id("idle")).to(id("running")))
                .action(ActionBuilder::new("stop").from(id("running")).to(id("idle")))
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn single_destination_action_advances_state() {
        let machine = start_stop();

        machine.fire("start", Args::new()).unwrap();
        assert_eq!(machine.current_state(), id("running"));

        let err = machine.fire("start", Args::new()).unwrap_err();
        assert_eq!(
            err,
            FsmError::IllegalTransition {
                action: "start".to_string(),
                state: "running".to_string(),
            }
        );
        assert_eq!(machine.current_state(), id("running"));
    }

    #[test]
    fn unknown_action_fails_without_touching_state() {
        let machine = start_stop();

        let err = machine.fire("jump", Args::new()).unwrap_err();
        assert!(matches!(err, FsmError::UnknownAction { .. }));
        assert_eq!(machine.current_state(), id("idle"));
    }

    #[test]
    fn machine_requires_initial_state() {
        let result = Machine::create(
            Description::builder()
                .action(ActionBuilder::new("start").from(id("idle")).to(id("running")))
                .build(),
        );

        assert!(matches!(result, Err(FsmError::Configuration(_))));
    }

    #[test]
    fn ambiguous_action_follows_event_callback() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .to(id("B"))
                        .to(id("C"))
                        .on_event(|ctx| {
                            let flag = ctx.kwarg_as::<bool>("flag").unwrap_or(false);
                            Ok(Some(if flag { id("B") } else { id("C") }))
                        }),
                )
                .action(ActionBuilder::new("reset").sources([id("B"), id("C")]).to(id("A")))
                .build(),
        )
        .unwrap();

        machine.fire("decide", Args::new().kwarg("flag", true)).unwrap();
        assert_eq!(machine.current_state(), id("B"));

        machine.fire("reset", Args::new()).unwrap();
        machine.fire("decide", Args::new().kwarg("flag", false)).unwrap();
        assert_eq!(machine.current_state(), id("C"));
    }

    #[test]
    fn undeclared_destination_is_rejected() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .destinations([id("B"), id("C")])
                        .on_event(|_| Ok(Some(id("Z")))),
                )
                .build(),
        )
        .unwrap()
        .with_history();

        let err = machine.fire("decide", Args::new()).unwrap_err();
        assert_eq!(
            err,
            FsmError::Transition(TransitionError::UndeclaredDestination {
                action: "decide".to_string(),
                returned: "Z".to_string(),
            })
        );
        assert_eq!(machine.current_state(), id("A"));
        assert!(machine.history().unwrap().is_empty());
    }

    #[test]
    fn ambiguous_action_without_choice_fails() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .destinations([id("B"), id("C")])
                        .on_event(|_| Ok(None)),
                )
                .build(),
        )
        .unwrap();

        let err = machine.fire("decide", Args::new()).unwrap_err();
        assert!(matches!(
            err,
            FsmError::Transition(TransitionError::NoDestination { .. })
        ));
        assert_eq!(machine.current_state(), id("A"));
    }

    #[test]
    fn missing_event_handler_is_reported_at_runtime() {
        let action = ActionBuilder::new("decide")
            .from(id("A"))
            .destinations([id("B"), id("C")])
            .build();

        let mut context = TransitionContext::new(id("A"), "decide", Args::new());
        let err = select_destination(&action, None, &mut context).unwrap_err();

        assert_eq!(
            err,
            TransitionError::MissingEventHandler {
                action: "decide".to_string()
            }
        );
    }

    #[test]
    fn single_destination_ignores_event_result_and_abort() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("idle"))
                .on_event(|_| Ok(Some(id("elsewhere"))))
                .action(ActionBuilder::new("start").from(id("idle")).to(id("running")))
                .action(
                    ActionBuilder::new("stop")
                        .from(id("running"))
                        .to(id("idle"))
                        .on_event(|_| Err(Abort::new("ignored"))),
                )
                .build(),
        )
        .unwrap();

        machine.fire("start", Args::new()).unwrap();
        assert_eq!(machine.current_state(), id("running"));

        machine.fire("stop", Args::new()).unwrap();
        assert_eq!(machine.current_state(), id("idle"));
    }

    #[test]
    fn before_abort_skips_event_and_keeps_state() {
        let event_calls = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&event_calls);

        let machine = Machine::create(
            Description::builder()
                .initial(id("idle"))
                .on_before(|_| Err(Abort::new("maintenance")))
                .on_event(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .action(ActionBuilder::new("start").from(id("idle")).to(id("running")))
                .build(),
        )
        .unwrap();

        let err = machine.fire("start", Args::new()).unwrap_err();
        assert_eq!(
            err,
            FsmError::Transition(TransitionError::Aborted {
                action: "start".to_string(),
                slot: CallbackSlot::Before,
                reason: "maintenance".to_string(),
            })
        );
        assert_eq!(event_calls.load(Ordering::SeqCst), 0);
        assert_eq!(machine.current_state(), id("idle"));
    }

    #[test]
    fn after_abort_discards_chosen_destination() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .destinations([id("B"), id("C")])
                        .on_event(|_| Ok(Some(id("B"))))
                        .on_after(|ctx| {
                            assert_eq!(ctx.destination(), Some(&id("B")));
                            Err(Abort::new("changed my mind"))
                        }),
                )
                .build(),
        )
        .unwrap()
        .with_history();

        let err = machine.fire("decide", Args::new()).unwrap_err();
        assert!(matches!(
            err,
            FsmError::Transition(TransitionError::Aborted {
                slot: CallbackSlot::After,
                ..
            })
        ));
        assert_eq!(machine.current_state(), id("A"));
        assert!(machine.history().unwrap().is_empty());
    }

    #[test]
    fn event_abort_fails_ambiguous_action() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .destinations([id("B"), id("C")])
                        .on_event(|_| Err(Abort::new("cannot decide"))),
                )
                .build(),
        )
        .unwrap();

        let err = machine.fire("decide", Args::new()).unwrap_err();
        assert!(matches!(
            err,
            FsmError::Transition(TransitionError::Aborted {
                slot: CallbackSlot::Event,
                ..
            })
        ));
        assert_eq!(machine.current_state(), id("A"));
    }

    #[test]
    fn per_action_callback_shadows_global_per_slot() {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (global_before, global_event, local_event) =
            (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));

        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .on_before(move |_| {
                    global_before.lock().push("global before");
                    Ok(())
                })
                .on_event(move |_| {
                    global_event.lock().push("global event");
                    Ok(Some(id("C")))
                })
                .action(
                    ActionBuilder::new("decide")
                        .from(id("A"))
                        .destinations([id("B"), id("C")])
                        .on_event(move |_| {
                            local_event.lock().push("local event");
                            Ok(Some(id("B")))
                        }),
                )
                .build(),
        )
        .unwrap();

        machine.fire("decide", Args::new()).unwrap();

        assert_eq!(*log.lock(), vec!["global before", "local event"]);
        assert_eq!(machine.current_state(), id("B"));
    }

    #[test]
    fn context_flows_through_phases() {
        let machine = Machine::create(
            Description::builder()
                .initial(id("A"))
                .on_before(|ctx| {
                    let source = ctx.source().to_string();
                    ctx.insert("seen_by_before", source);
                    Ok(())
                })
                .on_after(|ctx| {
                    assert_eq!(ctx.get("seen_by_before"), Some(&serde_json::json!("A")));
                    assert_eq!(ctx.action(), "go");
                    assert_eq!(ctx.arg(0), Some(&serde_json::json!(7)));
                    assert_eq!(ctx.destination(), Some(&id("B")));
                    Ok(())
                })
                .action(ActionBuilder::new("go").from(id("A")).to(id("B")))
                .build(),
        )
        .unwrap();

        machine.fire("go", Args::new().arg(7)).unwrap();
        assert_eq!(machine.current_state(), id("B"));
    }

    #[test]
    fn history_records_committed_transitions_only() {
        let machine = start_stop().with_history();

        machine.fire("start", Args::new()).unwrap();
        let _ = machine.fire("start", Args::new());
        machine.fire("stop", Args::new()).unwrap();

        let history = machine.history().unwrap();
        assert_eq!(history.actions(), vec!["start", "stop"]);
        let path: Vec<_> = history.get_path().into_iter().cloned().collect();
        assert_eq!(path, vec![id("idle"), id("running"), id("idle")]);
    }

    #[test]
    fn available_actions_track_current_state() {
        let machine = start_stop();

        assert!(machine.can("start"));
        assert!(!machine.can("stop"));
        assert!(!machine.can("jump"));
        assert_eq!(machine.available_actions(), vec!["start".to_string()]);

        machine.fire("start", Args::new()).unwrap();
        assert_eq!(machine.available_actions(), vec!["stop".to_string()]);
    }

    #[test]
    fn machines_share_one_registry() {
        let registry = Arc::clone(start_stop().registry());
        let first = Machine::with_registry(Arc::clone(&registry)).unwrap();
        let second = Machine::with_registry(registry).unwrap();

        first.fire("start", Args::new()).unwrap();

        assert_eq!(first.current_state(), id("running"));
        assert_eq!(second.current_state(), id("idle"));
    }

    #[test]
    fn history_is_off_by_default() {
        let machine = start_stop();
        machine.fire("start", Args::new()).unwrap();

        assert!(!machine.is_recording());
        assert!(machine.history().is_none());
    }

    fn toggle() -> Machine<StateId> {
        Machine::create(
            Description::builder()
                .initial(id("off"))
                .action(ActionBuilder::new("on").from(id("off")).to(id("on")))
                .action(ActionBuilder::new("off").from(id("on")).to(id("off")))
                .build(),
        )
        .unwrap()
    }

    fn time_fires(machine: &Machine<StateId>, count: usize) -> std::time::Duration {
        let started = std::time::Instant::now();
        for step in 0..count {
            let name = if step % 2 == 0 { "on" } else { "off" };
            machine.fire(name, Args::new()).unwrap();
        }
        started.elapsed()
    }

    #[test]
    fn recording_cost_does_not_grow_with_history() {
        let machine = toggle().with_history();

        let early = time_fires(&machine, 2_000);
        time_fires(&machine, 16_000);
        let late = time_fires(&machine, 2_000);

        assert_eq!(machine.history().unwrap().len(), 20_000);
        assert!(
            late <= early * 4 + std::time::Duration::from_millis(50),
            "late batch took {late:?}, early batch {early:?}"
        );
    }

    #[test]
    fn debug_does_not_wait_for_running_transition() {
        let machine = start_stop();
        let rendered = format!("{machine:?}");
        assert!(rendered.contains("idle"));

        let _held = machine.current.lock();
        let rendered = format!("{machine:?}");
        assert!(rendered.contains("<transition in progress>"));
    }

    #[test]
    fn callbacks_can_read_history_and_debug() {
        let handle: Arc<std::sync::OnceLock<std::sync::Weak<Machine<StateId>>>> =
            Arc::new(std::sync::OnceLock::new());
        let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (inner, seen) = (Arc::clone(&handle), Arc::clone(&observed));

        let machine = Arc::new(
            Machine::create(
                Description::builder()
                    .initial(id("idle"))
                    .on_after(move |_| {
                        if let Some(machine) = inner.get().and_then(|weak| weak.upgrade()) {
                            let recorded = machine.history().map_or(0, |history| history.len());
                            seen.lock().push((recorded, format!("{machine:?}")));
                        }
                        Ok(())
                    })
                    .action(ActionBuilder::new("start").from(id("idle")).to(id("running")))
                    .action(ActionBuilder::new("stop").from(id("running")).to(id("idle")))
                    .build(),
            )
            .unwrap()
            .with_history(),
        );
        handle.set(Arc::downgrade(&machine)).unwrap();

        machine.fire("start", Args::new()).unwrap();
        machine.fire("stop", Args::new()).unwrap();

        let observed = observed.lock();
        assert_eq!(observed.len(), 2);
        assert_eq!(observed[0].0, 0);
        assert_eq!(observed[1].0, 1);
        assert!(observed[1].1.contains("<transition in progress>"));
    }
}
