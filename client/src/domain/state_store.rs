//! Single source of truth for one controller's fetch state.
//!
//! The store validates every transition against the fetch state machine,
//! remembers the last payload and failure message, and fans changes out to
//! callback subscribers and `watch` receivers. Callbacks are handed back to the
//! caller as a [`Delivery`] so they run after every internal lock is released.
//!
//! Each transition is numbered. Deliveries run one at a time, and a delivery
//! whose transition has already been overtaken by a newer delivered one is
//! skipped, so subscribers never see an older state after a newer one.
//! Callbacks must not write to the store that is notifying them.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;

use super::{FetchState, Phase};

/// Callback invoked with the new state after every transition.
pub type StateCallback<T> = Arc<dyn Fn(&FetchState<T>) + Send + Sync>;

/// Handle returned by [`StateStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Errors raised when a write would break the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested transition is not part of the state machine.
    #[error("illegal fetch transition from {from} to {to}")]
    Illegal {
        /// Phase the store was in.
        from: Phase,
        /// Phase the write asked for.
        to: Phase,
    },
    /// The store was torn down and accepts no further writes.
    #[error("fetch state store has been torn down")]
    Closed,
}

/// Notifications produced by one transition, waiting to be delivered.
#[must_use = "subscribers are only notified when `deliver` is called"]
pub struct Delivery<T> {
    state: FetchState<T>,
    callbacks: Vec<StateCallback<T>>,
    sequence: u64,
    delivered: Arc<Mutex<u64>>,
}

impl<T> Delivery<T> {
    /// State the transition produced.
    pub const fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Invoke every subscriber captured at transition time.
    ///
    /// Returns `false` without calling anyone when a newer transition of the
    /// same store was delivered first.
    pub fn deliver(self) -> bool {
        let mut delivered = self
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.sequence <= *delivered {
            return false;
        }
        *delivered = self.sequence;
        for callback in &self.callbacks {
            callback(&self.state);
        }
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for Delivery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("state", &self.state)
            .field("subscribers", &self.callbacks.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

struct StoreInner<T> {
    last_payload: Option<T>,
    last_failure_message: Option<String>,
    subscribers: Vec<(SubscriptionId, StateCallback<T>)>,
    next_subscription: u64,
    sequence: u64,
    closed: bool,
}

/// Observable holder of a [`FetchState`].
pub struct StateStore<T> {
    sender: watch::Sender<FetchState<T>>,
    inner: Mutex<StoreInner<T>>,
    delivered: Arc<Mutex<u64>>,
}

impl<T: Clone> StateStore<T> {
    /// Create a store in the `Idle` phase.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(FetchState::Idle);
        Self {
            sender,
            inner: Mutex::new(StoreInner {
                last_payload: None,
                last_failure_message: None,
                subscribers: Vec::new(),
                next_subscription: 0,
                sequence: 0,
                closed: false,
            }),
            delivered: Arc::new(Mutex::new(0)),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FetchState<T> {
        self.sender.borrow().clone()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.sender.borrow().phase()
    }

    /// Last successful payload, kept through later `Loading` and `Failure`
    /// phases until a new success replaces it.
    pub fn last_payload(&self) -> Option<T> {
        self.lock().last_payload.clone()
    }

    /// Message of the most recent failure, if any.
    pub fn last_failure_message(&self) -> Option<String> {
        self.lock().last_failure_message.clone()
    }

    /// Register `callback` for every future transition.
    ///
    /// A torn-down store accepts the registration but never calls it.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FetchState<T>) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        if !inner.closed {
            inner.subscribers.push((id, Arc::new(callback)));
        }
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(existing, _)| *existing != id);
        inner.subscribers.len() != before
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<FetchState<T>> {
        self.sender.subscribe()
    }

    /// Whether [`StateStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Tear the store down: drop subscribers and refuse later writes.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    /// Enter `Loading` from `Idle`, `Success` or `Failure`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] when already loading and
    /// [`TransitionError::Closed`] after teardown.
    pub fn begin_loading(&self) -> Result<Delivery<T>, TransitionError> {
        self.transition(FetchState::Loading)
    }

    /// Leave `Loading` with a payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] outside `Loading` and
    /// [`TransitionError::Closed`] after teardown.
    pub fn complete_success(&self, payload: T) -> Result<Delivery<T>, TransitionError> {
        self.transition(FetchState::Success { payload })
    }

    /// Leave `Loading` with a user-facing failure message.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] outside `Loading` and
    /// [`TransitionError::Closed`] after teardown.
    pub fn complete_failure(
        &self,
        message: impl Into<String>,
    ) -> Result<Delivery<T>, TransitionError> {
        self.transition(FetchState::Failure {
            message: message.into(),
        })
    }

    fn transition(&self, next: FetchState<T>) -> Result<Delivery<T>, TransitionError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TransitionError::Closed);
        }

        let from = self.phase();
        let to = next.phase();
        if !is_permitted(from, to) {
            return Err(TransitionError::Illegal { from, to });
        }

        match &next {
            FetchState::Success { payload } => inner.last_payload = Some(payload.clone()),
            FetchState::Failure { message } => {
                inner.last_failure_message = Some(message.clone());
            }
            FetchState::Idle | FetchState::Loading => {}
        }
        self.sender.send_replace(next.clone());
        inner.sequence += 1;

        let callbacks = inner
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        Ok(Delivery {
            state: next,
            callbacks,
            sequence: inner.sequence,
            delivered: Arc::clone(&self.delivered),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for StateStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for StateStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("StateStore")
            .field("state", &*self.sender.borrow())
            .field("subscribers", &inner.subscribers.len())
            .field("closed", &inner.closed)
            .finish_non_exhaustive()
    }
}

const fn is_permitted(from: Phase, to: Phase) -> bool {
    matches!(
        (from, to),
        (Phase::Idle | Phase::Success | Phase::Failure, Phase::Loading)
            | (Phase::Loading, Phase::Success | Phase::Failure)
    )
}

#[cfg(test)]
mod tests {
    //! Transition and notification coverage for the state store.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> StateStore<u32> {
        StateStore::new()
    }

    fn recorder(store: &StateStore<u32>) -> Arc<Mutex<Vec<FetchState<u32>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().expect("seen mutex").push(state.clone()));
        seen
    }

    #[rstest]
    fn starts_idle(store: StateStore<u32>) {
        assert_eq!(store.snapshot(), FetchState::Idle);
        assert_eq!(store.last_payload(), None);
        assert_eq!(store.last_failure_message(), None);
    }

    #[rstest]
    fn notifies_subscribers_in_transition_order(store: StateStore<u32>) {
        let seen = recorder(&store);

        store.begin_loading().expect("idle -> loading").deliver();
        store.complete_success(5).expect("loading -> success").deliver();
        store.begin_loading().expect("success -> loading").deliver();
        store
            .complete_failure("Error fetching user")
            .expect("loading -> failure")
            .deliver();

        assert_eq!(
            *seen.lock().expect("seen mutex"),
            vec![
                FetchState::Loading,
                FetchState::Success { payload: 5 },
                FetchState::Loading,
                FetchState::Failure {
                    message: "Error fetching user".to_owned()
                },
            ]
        );
    }

    #[rstest]
    fn undelivered_transitions_still_update_snapshot(store: StateStore<u32>) {
        let seen = recorder(&store);
        let delivery = store.begin_loading().expect("idle -> loading");

        assert_eq!(store.snapshot(), FetchState::Loading);
        assert!(seen.lock().expect("seen mutex").is_empty());
        assert_eq!(delivery.state(), &FetchState::Loading);
        assert!(delivery.deliver());
        assert_eq!(seen.lock().expect("seen mutex").len(), 1);
    }

    #[rstest]
    fn overtaken_deliveries_are_skipped(store: StateStore<u32>) {
        let seen = recorder(&store);
        store.begin_loading().expect("loading").deliver();
        let first = store.complete_success(1).expect("success");
        store.begin_loading().expect("loading").deliver();
        let second = store.complete_success(2).expect("success");

        assert!(second.deliver());
        assert!(!first.deliver());
        assert_eq!(
            *seen.lock().expect("seen mutex"),
            vec![
                FetchState::Loading,
                FetchState::Loading,
                FetchState::Success { payload: 2 },
            ]
        );
        assert_eq!(store.snapshot(), FetchState::Success { payload: 2 });
    }

    #[rstest]
    fn deliveries_from_other_threads_wait_their_turn() {
        let store = Arc::new(StateStore::<u32>::new());
        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state: &FetchState<u32>| {
            if state == &FetchState::Loading {
                entered_tx.send(()).expect("test alive");
                release_rx
                    .lock()
                    .expect("release mutex")
                    .recv()
                    .expect("released");
            }
            sink.lock().expect("seen mutex").push(state.clone());
        });

        let first = store.begin_loading().expect("loading");
        let blocked = std::thread::spawn(move || first.deliver());
        entered_rx.recv().expect("first delivery running");

        let writer = Arc::clone(&store);
        let second = std::thread::spawn(move || {
            writer.complete_success(4).expect("success").deliver()
        });
        release_tx.send(()).expect("delivery waiting");

        assert!(blocked.join().expect("first thread"));
        assert!(second.join().expect("second thread"));
        assert_eq!(
            *seen.lock().expect("seen mutex"),
            vec![FetchState::Loading, FetchState::Success { payload: 4 }]
        );
    }

    #[rstest]
    #[case::success_from_idle(Phase::Idle, Phase::Success)]
    #[case::failure_from_idle(Phase::Idle, Phase::Failure)]
    #[case::loading_twice(Phase::Loading, Phase::Loading)]
    #[case::success_twice(Phase::Success, Phase::Success)]
    #[case::failure_to_success(Phase::Failure, Phase::Success)]
    fn refuses_transitions_outside_the_state_machine(
        store: StateStore<u32>,
        #[case] from: Phase,
        #[case] to: Phase,
    ) {
        drive_to(&store, from);
        let result = match to {
            Phase::Loading => store.begin_loading(),
            Phase::Success => store.complete_success(1),
            Phase::Failure => store.complete_failure("boom"),
            Phase::Idle => panic!("no transition targets idle"),
        };

        let err = result.expect_err("transition refused");
        assert_eq!(err, TransitionError::Illegal { from, to });
        assert_eq!(store.phase(), from, "refused writes leave the phase alone");
    }

    fn drive_to(store: &StateStore<u32>, phase: Phase) {
        match phase {
            Phase::Idle => {}
            Phase::Loading => {
                store.begin_loading().expect("loading").deliver();
            }
            Phase::Success => {
                store.begin_loading().expect("loading").deliver();
                store.complete_success(9).expect("success").deliver();
            }
            Phase::Failure => {
                store.begin_loading().expect("loading").deliver();
                store.complete_failure("boom").expect("failure").deliver();
            }
        }
    }

    #[rstest]
    fn keeps_last_payload_until_replaced(store: StateStore<u32>) {
        drive_to(&store, Phase::Success);
        store.begin_loading().expect("loading").deliver();
        assert_eq!(store.last_payload(), Some(9));

        store.complete_failure("Error fetching user").expect("failure").deliver();
        assert_eq!(store.last_payload(), Some(9));
        assert_eq!(
            store.last_failure_message().as_deref(),
            Some("Error fetching user")
        );

        store.begin_loading().expect("loading").deliver();
        store.complete_success(10).expect("success").deliver();
        assert_eq!(store.last_payload(), Some(10));
    }

    #[rstest]
    fn unsubscribed_callbacks_are_not_called(store: StateStore<u32>) {
        let seen = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |_| *sink.lock().expect("count mutex") += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.begin_loading().expect("loading").deliver();
        assert_eq!(*seen.lock().expect("count mutex"), 0);
    }

    #[rstest]
    fn closed_store_refuses_writes_and_drops_subscribers(store: StateStore<u32>) {
        let seen = recorder(&store);
        store.begin_loading().expect("loading").deliver();
        store.close();

        assert!(store.is_closed());
        assert_eq!(
            store.complete_success(1).expect_err("closed"),
            TransitionError::Closed
        );
        assert_eq!(store.snapshot(), FetchState::Loading);
        assert_eq!(seen.lock().expect("seen mutex").len(), 1);
    }

    #[rstest]
    fn callbacks_may_read_the_store() {
        let store = Arc::new(StateStore::<u32>::new());
        let observed = Arc::new(Mutex::new(Vec::new()));
        let reader = Arc::clone(&store);
        let sink = Arc::clone(&observed);
        store.subscribe(move |_| {
            sink.lock()
                .expect("observed mutex")
                .push((reader.phase(), reader.last_payload()));
        });

        store.begin_loading().expect("loading").deliver();
        store.complete_success(3).expect("success").deliver();

        assert_eq!(
            *observed.lock().expect("observed mutex"),
            vec![(Phase::Loading, None), (Phase::Success, Some(3))]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn watch_receivers_observe_changes(store: StateStore<u32>) {
        let mut receiver = store.watch();
        store.begin_loading().expect("loading").deliver();

        receiver.changed().await.expect("sender alive");
        assert_eq!(*receiver.borrow_and_update(), FetchState::Loading);
    }
}
