//! Remote resource fetch controller.
//!
//! A controller owns the fetch state for one screen. It validates identifier
//! input, admits at most one request at a time, tags each request with a
//! generation so results that arrive after teardown are dropped, and keeps the
//! last request while in `Failure` so it can be retried.
//!
//! Lock order is always control state first, then the store. Subscriber
//! callbacks run after both locks are released.
//!
//! An admitted request that never commits, because its future was dropped or
//! its query panicked, settles the controller in `Failure` with the generic
//! message so it can be triggered or retried again.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::fetch_executor::{self, Execution};
use super::ports::{ResourceQuery, ResourceSourceError};
use super::state_store::{StateStore, SubscriptionId, TransitionError};
use super::{FetchState, Phase, ResourceId, ResourceIdValidationError};

/// Pre-flight rejection shown to the user instead of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationNotice {
    /// Dismissible notice text.
    pub message: &'static str,
    /// Why the input was rejected.
    pub reason: ResourceIdValidationError,
}

/// What a trigger, fetch or retry call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A request ran and the store settled in this phase.
    Settled(Phase),
    /// Input failed validation; no transition and no request happened.
    Rejected(ValidationNotice),
    /// A request is already in flight; nothing happened.
    AlreadyLoading,
    /// `retry` was called outside `Failure`; nothing happened.
    NothingToRetry,
    /// The controller was torn down, so the call or its result was dropped.
    Discarded,
}

struct ControlState<R> {
    in_flight: bool,
    generation: u64,
    retained_request: Option<R>,
    last_error: Option<ResourceSourceError>,
    torn_down: bool,
}

struct Ticket<R> {
    generation: u64,
    request: R,
}

enum Admission<R> {
    Started(Ticket<R>),
    Refused(TriggerOutcome),
}

/// Admitted request that has not committed yet.
///
/// Dropping it before [`PendingFetch::run`] commits abandons the request.
struct PendingFetch<C, Q>
where
    C: Deref<Target = FetchController<Q>>,
    Q: ResourceQuery,
{
    controller: C,
    generation: u64,
    committed: bool,
}

impl<C, Q> PendingFetch<C, Q>
where
    C: Deref<Target = FetchController<Q>>,
    Q: ResourceQuery,
{
    const fn new(controller: C, generation: u64) -> Self {
        Self {
            controller,
            generation,
            committed: false,
        }
    }

    async fn run(mut self, request: Q::Request) -> Result<TriggerOutcome, TransitionError> {
        let execution =
            fetch_executor::execute(self.controller.query.as_ref(), &request).await;
        self.committed = true;
        self.controller.commit(self.generation, execution)
    }
}

impl<C, Q> Drop for PendingFetch<C, Q>
where
    C: Deref<Target = FetchController<Q>>,
    Q: ResourceQuery,
{
    fn drop(&mut self) {
        if !self.committed {
            self.controller.abandon(self.generation);
        }
    }
}

/// Observable controller driving one resource through the fetch lifecycle.
pub struct FetchController<Q: ResourceQuery> {
    query: Arc<Q>,
    store: StateStore<Q::Payload>,
    control: Mutex<ControlState<Q::Request>>,
}

impl<Q: ResourceQuery> FetchController<Q> {
    /// Build an `Idle` controller.
    pub fn new(query: Arc<Q>) -> Self {
        Self {
            query,
            store: StateStore::new(),
            control: Mutex::new(ControlState {
                in_flight: false,
                generation: 0,
                retained_request: None,
                last_error: None,
                torn_down: false,
            }),
        }
    }

    /// Build a controller that starts loading `request` immediately.
    ///
    /// The controller is already `Loading` when this returns. The request
    /// runs on a spawned Tokio task whose handle resolves to the outcome.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn_mounted(
        query: Arc<Q>,
        request: Q::Request,
    ) -> (
        Arc<Self>,
        JoinHandle<Result<TriggerOutcome, TransitionError>>,
    ) {
        let controller = Arc::new(Self::new(query));
        let admission = controller.begin(request).map(|admission| match admission {
            Admission::Started(ticket) => Ok((
                PendingFetch::new(Arc::clone(&controller), ticket.generation),
                ticket.request,
            )),
            Admission::Refused(outcome) => Err(outcome),
        });
        let handle = tokio::spawn(async move {
            match admission {
                Ok(Ok((pending, request))) => pending.run(request).await,
                Ok(Err(outcome)) => Ok(outcome),
                Err(error) => Err(error),
            }
        });
        (controller, handle)
    }

    /// Fetch an already validated request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] only if the store refuses a write the
    /// controller believed legal.
    pub async fn fetch(&self, request: Q::Request) -> Result<TriggerOutcome, TransitionError> {
        match self.begin(request)? {
            Admission::Started(ticket) => {
                PendingFetch::new(self, ticket.generation)
                    .run(ticket.request)
                    .await
            }
            Admission::Refused(outcome) => Ok(outcome),
        }
    }

    /// Re-run the request that produced the current `Failure`.
    ///
    /// # Errors
    ///
    /// See [`FetchController::fetch`].
    pub async fn retry(&self) -> Result<TriggerOutcome, TransitionError> {
        let request = {
            let control = self.lock_control();
            if control.torn_down {
                return Ok(TriggerOutcome::Discarded);
            }
            match (&control.retained_request, self.store.phase()) {
                (Some(request), Phase::Failure) => request.clone(),
                _ => return Ok(TriggerOutcome::NothingToRetry),
            }
        };
        info!(resource = Q::RESOURCE, "retrying failed fetch");
        self.fetch(request).await
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FetchState<Q::Payload> {
        self.store.snapshot()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.store.phase()
    }

    /// Last successful payload, kept while a newer request loads or fails.
    pub fn last_payload(&self) -> Option<Q::Payload> {
        self.store.last_payload()
    }

    /// Underlying error of the latest failure, for logs and diagnostics.
    pub fn last_error(&self) -> Option<ResourceSourceError> {
        self.lock_control().last_error.clone()
    }

    /// Whether a request is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        self.lock_control().in_flight
    }

    /// Register a callback for every transition.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FetchState<Q::Payload>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Receiver observing every state change.
    pub fn watch(&self) -> watch::Receiver<FetchState<Q::Payload>> {
        self.store.watch()
    }

    /// Tear the controller down with its screen.
    ///
    /// Subscribers are dropped, the store stops accepting writes and any
    /// request still in flight becomes stale.
    pub fn teardown(&self) {
        let mut control = self.lock_control();
        if control.torn_down {
            return;
        }
        control.torn_down = true;
        control.generation += 1;
        control.in_flight = false;
        control.retained_request = None;
        self.store.close();
        debug!(resource = Q::RESOURCE, "controller torn down");
    }

    fn begin(&self, request: Q::Request) -> Result<Admission<Q::Request>, TransitionError> {
        let (ticket, delivery) = {
            let mut control = self.lock_control();
            if control.torn_down {
                return Ok(Admission::Refused(TriggerOutcome::Discarded));
            }
            if control.in_flight {
                debug!(resource = Q::RESOURCE, "fetch already in flight");
                return Ok(Admission::Refused(TriggerOutcome::AlreadyLoading));
            }

            let delivery = self.store.begin_loading()?;
            control.in_flight = true;
            control.generation += 1;
            control.retained_request = Some(request.clone());
            let ticket = Ticket {
                generation: control.generation,
                request,
            };
            (ticket, delivery)
        };
        delivery.deliver();
        Ok(Admission::Started(ticket))
    }

    fn commit(
        &self,
        generation: u64,
        execution: Execution<Q::Payload>,
    ) -> Result<TriggerOutcome, TransitionError> {
        let delivery = {
            let mut control = self.lock_control();
            if control.torn_down || control.generation != generation {
                debug!(
                    resource = Q::RESOURCE,
                    generation, "discarding stale fetch result"
                );
                return Ok(TriggerOutcome::Discarded);
            }

            let delivery = match execution {
                Execution::Succeeded(payload) => {
                    let delivery = self.store.complete_success(payload)?;
                    control.retained_request = None;
                    control.last_error = None;
                    delivery
                }
                Execution::Failed { message, error } => {
                    let delivery = self.store.complete_failure(message)?;
                    control.last_error = Some(error);
                    delivery
                }
            };
            control.in_flight = false;
            delivery
        };

        let phase = delivery.state().phase();
        delivery.deliver();
        Ok(TriggerOutcome::Settled(phase))
    }

    fn abandon(&self, generation: u64) {
        let delivery = {
            let mut control = self.lock_control();
            if control.torn_down || control.generation != generation {
                return;
            }
            control.generation += 1;
            control.in_flight = false;
            control.last_error = Some(ResourceSourceError::cancelled(
                "request dropped before it completed",
            ));
            match self.store.complete_failure(Q::FAILURE_MESSAGE) {
                Ok(delivery) => delivery,
                Err(error) => {
                    warn!(resource = Q::RESOURCE, %error, "could not settle abandoned fetch");
                    return;
                }
            }
        };
        warn!(
            resource = Q::RESOURCE,
            generation, "fetch abandoned before it completed"
        );
        delivery.deliver();
    }

    fn lock_control(&self) -> MutexGuard<'_, ControlState<Q::Request>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<Q> FetchController<Q>
where
    Q: ResourceQuery<Request = ResourceId>,
{
    /// Validate raw identifier input, then fetch it.
    ///
    /// Blank input is rejected synchronously with a [`ValidationNotice`]; the
    /// phase is left unchanged and no request is issued.
    ///
    /// # Errors
    ///
    /// See [`FetchController::fetch`].
    pub async fn trigger(&self, raw: &str) -> Result<TriggerOutcome, TransitionError> {
        match ResourceId::parse(raw) {
            Ok(id) => self.fetch(id).await,
            Err(reason) => {
                info!(resource = Q::RESOURCE, "blank identifier rejected");
                Ok(TriggerOutcome::Rejected(ValidationNotice {
                    message: Q::BLANK_INPUT_NOTICE,
                    reason,
                }))
            }
        }
    }
}

impl<Q> fmt::Debug for FetchController<Q>
where
    Q: ResourceQuery,
    Q::Payload: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.lock_control();
        f.debug_struct("FetchController")
            .field("resource", &Q::RESOURCE)
            .field("store", &self.store)
            .field("in_flight", &control.in_flight)
            .field("generation", &control.generation)
            .field("torn_down", &control.torn_down)
            .finish_non_exhaustive()
    }
}
