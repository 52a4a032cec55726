//! Session phase and in-flight operation types.

use tokio::task::JoinHandle;

use carvote_client::ApiError;
use carvote_types::{Car, CarId, VoteResult};

use crate::errors::SessionFailure;
use crate::initializer::InitOutcome;
use crate::vote_recorder::VoteError;

/// Session phase state machine.
///
/// # State Machine
/// ```text
///            store empty: init, then delayed refetch
///                 ┌──────────┐
///                 v          │
/// ┌──────────────────────────┴┐  car fetched  ┌──────────────────┐
/// │ Loading { previous }      │ ────────────> │ Displaying { car }│
/// └───────────────────────────┘               └──────────────────┘
///        ^                                            │ vote recorded
///        │ auto-advance fires                         v
///        │                                ┌─────────────────────────────┐
///        └─────────────────────────────── │ ShowingResult { car, result }│
///                                         └─────────────────────────────┘
///
///   any fatal fetch / init / vote error ──> Failed { failure, last_car }
/// ```
///
/// The vote result lives only in `ShowingResult`, so a result without a car,
/// or a result outside that phase, cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Waiting for a car. `previous` is the car whose result was just shown,
    /// or `None` on the first load.
    Loading { previous: Option<Car> },
    Displaying { car: Car },
    ShowingResult { car: Car, result: VoteResult },
    /// Sink state; only a fresh session leaves it.
    Failed {
        failure: SessionFailure,
        last_car: Option<Car>,
    },
}

impl SessionPhase {
    #[must_use]
    pub fn tag(&self) -> PhaseTag {
        match self {
            Self::Loading { .. } => PhaseTag::Loading,
            Self::Displaying { .. } => PhaseTag::Displaying,
            Self::ShowingResult { .. } => PhaseTag::ShowingResult,
            Self::Failed { .. } => PhaseTag::Failed,
        }
    }

    #[must_use]
    pub fn car(&self) -> Option<&Car> {
        match self {
            Self::Displaying { car } | Self::ShowingResult { car, .. } => Some(car),
            Self::Loading { previous: car } | Self::Failed { last_car: car, .. } => car.as_ref(),
        }
    }

    /// Consume the phase, keeping whichever car it carried.
    pub(crate) fn into_car(self) -> Option<Car> {
        match self {
            Self::Displaying { car } | Self::ShowingResult { car, .. } => Some(car),
            Self::Loading { previous: car } | Self::Failed { last_car: car, .. } => car,
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&VoteResult> {
        match self {
            Self::ShowingResult { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SessionFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Payload-free discriminant of [`SessionPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseTag {
    Loading,
    Displaying,
    ShowingResult,
    Failed,
}

/// Named edges of the session graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEdge {
    /// Loading -> Displaying.
    ItemLoaded,
    /// Loading -> Loading: empty store, initialize and fetch again.
    RetryAfterInit,
    /// Displaying -> ShowingResult.
    VoteRecorded,
    /// ShowingResult -> Loading.
    Advance,
    /// Any live phase -> Failed.
    Fail,
}

impl SessionEdge {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ItemLoaded => "item_loaded",
            Self::RetryAfterInit => "retry_after_init",
            Self::VoteRecorded => "vote_recorded",
            Self::Advance => "advance",
            Self::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchAttempt {
    First,
    /// The single retry after seeding an empty store.
    AfterInit,
}

/// The one backend operation the session may have outstanding.
///
/// Each carries the generation it was dispatched under; a result whose
/// generation is no longer current is discarded.
#[derive(Debug)]
pub(crate) enum InFlight {
    Fetch {
        attempt: FetchAttempt,
        generation: u64,
        handle: JoinHandle<Result<Car, ApiError>>,
    },
    Initialize {
        generation: u64,
        handle: JoinHandle<Result<InitOutcome, ApiError>>,
    },
    Vote {
        car_id: CarId,
        generation: u64,
        handle: JoinHandle<Result<VoteResult, VoteError>>,
    },
}

impl InFlight {
    pub(crate) fn is_finished(&self) -> bool {
        match self {
            Self::Fetch { handle, .. } => handle.is_finished(),
            Self::Initialize { handle, .. } => handle.is_finished(),
            Self::Vote { handle, .. } => handle.is_finished(),
        }
    }

    pub(crate) fn abort(&self) {
        match self {
            Self::Fetch { handle, .. } => handle.abort(),
            Self::Initialize { handle, .. } => handle.abort(),
            Self::Vote { handle, .. } => handle.abort(),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Initialize { .. } => "initialize",
            Self::Vote { .. } => "vote",
        }
    }
}
