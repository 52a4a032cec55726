//! Rating session engine for carvote.
//!
//! [`SessionController`] owns the whole session: which car is up, whether a
//! vote result is being shown, the one backend call that may be outstanding,
//! and the one delayed action that may be scheduled. It has no rendering or
//! input dependencies; a driver calls [`SessionController::tick`] on a
//! timer, forwards votes, and re-renders when [`SessionController::version`]
//! changes.

use std::mem;
use std::panic::Location;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};

use carvote_client::{ApiError, CarBackend};
use carvote_types::{Car, CarId, VoteChoice, VoteResult};

mod config;
mod errors;
mod initializer;
mod scheduler;
mod state;
mod transition;
mod vote_recorder;

pub use config::SessionConfig;
pub use errors::{FailureKind, GENERIC_FAILURE_MESSAGE, RESTART_HINT, SessionFailure};
pub use initializer::{InitOutcome, Initializer};
pub use scheduler::{ScheduledKind, ScheduledTask, Scheduler};
pub use state::{PhaseTag, SessionEdge, SessionPhase};
pub use vote_recorder::{VoteError, VoteRecorder};

use state::{FetchAttempt, InFlight};

/// What happened to a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDispatch {
    Submitted,
    Ignored(IgnoredVote),
}

/// Why a vote request was dropped without any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredVote {
    /// Votes are only accepted while a car is displayed.
    NotDisplaying(PhaseTag),
    /// A vote for the displayed car is already being recorded.
    VoteInFlight,
    TornDown,
}

/// The session state machine.
///
/// Requires a tokio runtime: backend calls run as spawned tasks and are
/// collected in [`Self::tick`].
pub struct SessionController<B: CarBackend> {
    backend: Arc<B>,
    initializer: Initializer<B>,
    recorder: VoteRecorder<B>,
    config: SessionConfig,
    phase: SessionPhase,
    /// Set once the store has been seeded (or found populated); never unset.
    initialized: bool,
    /// Bumped whenever outstanding work must be disowned.
    generation: u64,
    in_flight: Option<InFlight>,
    scheduler: Scheduler,
    /// Bumped on every observable state change.
    version: u64,
    torn_down: bool,
}

impl<B: CarBackend> SessionController<B> {
    /// Enter `Loading` and fetch the first car.
    pub fn start(backend: Arc<B>, config: SessionConfig) -> Self {
        let mut controller = Self {
            initializer: Initializer::new(Arc::clone(&backend)),
            recorder: VoteRecorder::new(Arc::clone(&backend)),
            backend,
            config,
            phase: SessionPhase::Loading { previous: None },
            initialized: false,
            generation: 0,
            in_flight: None,
            scheduler: Scheduler::new(),
            version: 0,
            torn_down: false,
        };
        tracing::info!(
            advance_delay_ms = duration_ms(config.advance_delay),
            refetch_delay_ms = duration_ms(config.refetch_delay),
            "Session started"
        );
        controller.spawn_fetch(FetchAttempt::First);
        controller
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// The car the session is currently about.
    ///
    /// While loading the next car this is the one just rated; after a
    /// failure it is the last car that was shown.
    #[must_use]
    pub fn car(&self) -> Option<&Car> {
        self.phase.car()
    }

    #[must_use]
    pub fn result(&self) -> Option<&VoteResult> {
        self.phase.result()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.phase.failure()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn is_vote_pending(&self) -> bool {
        matches!(self.in_flight, Some(InFlight::Vote { .. }))
    }

    #[must_use]
    pub fn pending_task(&self) -> Option<ScheduledTask> {
        self.scheduler.pending()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Collect a finished backend call and fire a due scheduled task.
    pub fn tick(&mut self) {
        if self.torn_down {
            return;
        }
        self.poll_in_flight();
        self.poll_scheduled(Instant::now());
    }

    /// Record a vote for the displayed car.
    pub fn vote(&mut self, choice: VoteChoice) -> VoteDispatch {
        if self.torn_down {
            return ignore_vote(choice, IgnoredVote::TornDown);
        }
        if self.is_vote_pending() {
            return ignore_vote(choice, IgnoredVote::VoteInFlight);
        }
        let SessionPhase::Displaying { car } = &self.phase else {
            return ignore_vote(choice, IgnoredVote::NotDisplaying(self.phase.tag()));
        };

        let car_id = car.id.clone();
        tracing::info!(car_id = %car_id, choice = choice.as_str(), "Submitting vote");
        let handle = tokio::spawn(self.recorder.submit(car_id.clone(), choice));
        self.in_flight = Some(InFlight::Vote {
            car_id,
            generation: self.generation,
            handle,
        });
        self.bump_version();
        VoteDispatch::Submitted
    }

    /// Stop the session: cancel the scheduled task and disown in-flight work.
    ///
    /// Afterwards ticks and votes are no-ops. Idempotent; also run on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.scheduler.cancel();
        self.abort_in_flight();
        self.generation += 1;
        tracing::info!(phase = ?self.phase.tag(), "Session torn down");
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    fn abort_in_flight(&mut self) {
        if let Some(op) = self.in_flight.take() {
            tracing::debug!(operation = op.label(), "Aborting in-flight operation");
            op.abort();
        }
    }

    fn spawn_fetch(&mut self, attempt: FetchAttempt) {
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move { backend.random_car().await });
        tracing::debug!(attempt = ?attempt, generation = self.generation, "Fetching random car");
        self.in_flight = Some(InFlight::Fetch {
            attempt,
            generation: self.generation,
            handle,
        });
    }

    fn spawn_initialize(&mut self) {
        let handle = tokio::spawn(self.initializer.ensure_initialized());
        self.in_flight = Some(InFlight::Initialize {
            generation: self.generation,
            handle,
        });
    }

    fn poll_in_flight(&mut self) {
        let Some(op) = self.in_flight.take_if(|op| op.is_finished()) else {
            return;
        };

        match op {
            InFlight::Fetch {
                attempt,
                generation,
                mut handle,
            } => {
                let Some(outcome) = settle(&mut handle) else {
                    self.in_flight = Some(InFlight::Fetch {
                        attempt,
                        generation,
                        handle,
                    });
                    return;
                };
                if self.is_stale(generation, "fetch") {
                    return;
                }
                self.on_fetch_complete(attempt, outcome);
            }
            InFlight::Initialize {
                generation,
                mut handle,
            } => {
                let Some(outcome) = settle(&mut handle) else {
                    self.in_flight = Some(InFlight::Initialize { generation, handle });
                    return;
                };
                if self.is_stale(generation, "initialize") {
                    return;
                }
                self.on_initialize_complete(outcome);
            }
            InFlight::Vote {
                car_id,
                generation,
                mut handle,
            } => {
                let Some(outcome) = settle(&mut handle) else {
                    self.in_flight = Some(InFlight::Vote {
                        car_id,
                        generation,
                        handle,
                    });
                    return;
                };
                if self.is_stale(generation, "vote") {
                    return;
                }
                self.on_vote_complete(&car_id, outcome);
            }
        }
    }

    fn is_stale(&self, generation: u64, operation: &'static str) -> bool {
        let stale = generation != self.generation;
        if stale {
            tracing::debug!(
                operation,
                generation,
                current = self.generation,
                "Discarding stale result"
            );
        }
        stale
    }

    fn on_fetch_complete(
        &mut self,
        attempt: FetchAttempt,
        outcome: Result<Result<Car, ApiError>, JoinError>,
    ) {
        if self.phase.tag() != PhaseTag::Loading {
            tracing::debug!(phase = ?self.phase.tag(), "Discarding fetch result outside Loading");
            return;
        }

        match outcome {
            Ok(Ok(car)) => {
                tracing::info!(car_id = %car.id, car = %car, "Car loaded");
                self.transition(SessionPhase::Displaying { car });
            }
            Ok(Err(ApiError::StoreEmpty)) if attempt == FetchAttempt::First => {
                tracing::info!("Car store empty; initializing");
                let from = self.phase.tag();
                let previous = mem::replace(&mut self.phase, SessionPhase::Loading { previous: None })
                    .into_car();
                self.transition_from(from, SessionPhase::Loading { previous });
                self.spawn_initialize();
            }
            Ok(Err(ApiError::StoreEmpty)) => {
                self.fail(SessionFailure::new(
                    FailureKind::Fetch,
                    "car store still empty after initialization",
                ));
            }
            Ok(Err(err)) => {
                self.fail(SessionFailure::new(FailureKind::Fetch, err.to_string()));
            }
            Err(join_err) => {
                self.fail(SessionFailure::new(
                    FailureKind::Fetch,
                    join_failure_detail("fetch", &join_err),
                ));
            }
        }
    }

    fn on_initialize_complete(&mut self, outcome: Result<Result<InitOutcome, ApiError>, JoinError>) {
        match outcome {
            Ok(Ok(init)) => {
                self.initialized = true;
                tracing::debug!(outcome = ?init, "Initialization complete");
                self.scheduler.schedule(
                    ScheduledKind::Refetch,
                    Instant::now(),
                    self.config.refetch_delay,
                );
                self.bump_version();
            }
            Ok(Err(err)) => {
                self.fail(SessionFailure::new(FailureKind::Init, err.to_string()));
            }
            Err(join_err) => {
                self.fail(SessionFailure::new(
                    FailureKind::Init,
                    join_failure_detail("initialize", &join_err),
                ));
            }
        }
    }

    fn on_vote_complete(
        &mut self,
        car_id: &CarId,
        outcome: Result<Result<VoteResult, VoteError>, JoinError>,
    ) {
        let displayed = match &self.phase {
            SessionPhase::Displaying { car } => car.id == *car_id,
            _ => false,
        };
        if !displayed {
            tracing::debug!(car_id = %car_id, phase = ?self.phase.tag(), "Discarding vote result for car no longer displayed");
            return;
        }

        match outcome {
            Ok(Ok(result)) => {
                let from = self.phase.tag();
                let car = match mem::replace(&mut self.phase, SessionPhase::Loading { previous: None }) {
                    SessionPhase::Displaying { car } => car,
                    other => {
                        self.phase = other;
                        return;
                    }
                };
                self.transition_from(from, SessionPhase::ShowingResult { car, result });
                self.scheduler.schedule(
                    ScheduledKind::AutoAdvance,
                    Instant::now(),
                    self.config.advance_delay,
                );
            }
            Ok(Err(err)) => {
                self.fail(SessionFailure::new(FailureKind::Vote, err.to_string()));
            }
            Err(join_err) => {
                self.fail(SessionFailure::new(
                    FailureKind::Vote,
                    join_failure_detail("vote", &join_err),
                ));
            }
        }
    }

    fn poll_scheduled(&mut self, now: Instant) {
        let Some(kind) = self.scheduler.take_due(now) else {
            return;
        };
        tracing::debug!(kind = kind.as_str(), "Scheduled task due");

        match (kind, self.phase.tag()) {
            (ScheduledKind::Refetch, PhaseTag::Loading) if self.in_flight.is_none() => {
                self.spawn_fetch(FetchAttempt::AfterInit);
            }
            (ScheduledKind::AutoAdvance, PhaseTag::ShowingResult) => {
                let from = self.phase.tag();
                let previous = mem::replace(&mut self.phase, SessionPhase::Loading { previous: None })
                    .into_car();
                self.transition_from(from, SessionPhase::Loading { previous });
                self.spawn_fetch(FetchAttempt::First);
            }
            (kind, phase) => {
                tracing::debug!(
                    kind = kind.as_str(),
                    phase = ?phase,
                    "Dropping scheduled task that no longer applies"
                );
            }
        }
    }

    /// Enter `Failed`, keeping the last car and disowning outstanding work.
    fn fail(&mut self, failure: SessionFailure) {
        self.scheduler.cancel();
        self.abort_in_flight();
        self.generation += 1;

        let from = self.phase.tag();
        if from == PhaseTag::Failed {
            return;
        }
        tracing::warn!(
            kind = failure.kind.as_str(),
            detail = %failure.detail,
            "Session failed"
        );
        let last_car =
            mem::replace(&mut self.phase, SessionPhase::Loading { previous: None }).into_car();
        self.transition_from(from, SessionPhase::Failed { failure, last_car });
    }

    /// Authoritative phase transition point.
    #[track_caller]
    fn transition(&mut self, next: SessionPhase) {
        let from = self.phase.tag();
        self.transition_from(from, next);
    }

    /// Like [`Self::transition`], but with an explicit `from` tag for callers
    /// that have already taken the current phase with `mem::replace`.
    #[track_caller]
    fn transition_from(&mut self, from: PhaseTag, next: SessionPhase) {
        let to = next.tag();
        let receipt = transition::transition_receipt(from, to);
        let legal = receipt.is_some_and(transition::receipt_is_legal);
        if !legal {
            let loc = Location::caller();
            tracing::warn!(
                from = ?from,
                to = ?to,
                file = loc.file(),
                line = loc.line(),
                column = loc.column(),
                "Illegal session transition",
            );
        }
        debug_assert!(legal, "Illegal session transition: {from:?} -> {to:?}");
        if let Some(receipt) = receipt {
            tracing::info!(
                from = ?from,
                to = ?to,
                edge = receipt.edge().as_str(),
                "Session transition",
            );
        }
        self.phase = next;
        self.bump_version();
    }
}

impl<B: CarBackend> Drop for SessionController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn ignore_vote(choice: VoteChoice, reason: IgnoredVote) -> VoteDispatch {
    tracing::debug!(choice = choice.as_str(), reason = ?reason, "Ignoring vote");
    VoteDispatch::Ignored(reason)
}

/// Take a finished task's output without blocking; `None` if it is not ready.
fn settle<T>(handle: &mut JoinHandle<T>) -> Option<Result<T, JoinError>> {
    handle.now_or_never()
}

fn join_failure_detail(operation: &'static str, err: &JoinError) -> String {
    if err.is_panic() {
        tracing::error!(operation, "Session task panicked");
        format!("{operation} task panicked")
    } else {
        format!("{operation} task cancelled")
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
