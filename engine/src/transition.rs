//! Session transition graph authority.
//!
//! The single encoding point for named `SessionPhase` edges and their
//! legality. The controller routes every phase change through here.

use crate::state::{PhaseTag, SessionEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransitionReceipt {
    from: PhaseTag,
    edge: SessionEdge,
    to: PhaseTag,
}

impl TransitionReceipt {
    #[must_use]
    pub(crate) const fn edge(self) -> SessionEdge {
        self.edge
    }
}

#[must_use]
pub(crate) fn transition_receipt(from: PhaseTag, to: PhaseTag) -> Option<TransitionReceipt> {
    transition_edge(from, to).map(|edge| TransitionReceipt { from, edge, to })
}

#[must_use]
pub(crate) fn receipt_is_legal(receipt: TransitionReceipt) -> bool {
    is_legal_transition(receipt.from, receipt.edge, receipt.to)
}

#[must_use]
pub(crate) fn transition_edge(from: PhaseTag, to: PhaseTag) -> Option<SessionEdge> {
    use PhaseTag::{Displaying, Failed, Loading, ShowingResult};
    use SessionEdge::{Advance, Fail, ItemLoaded, RetryAfterInit, VoteRecorded};

    match (from, to) {
        (Loading, Loading) => Some(RetryAfterInit),
        (Loading, Displaying) => Some(ItemLoaded),
        (Displaying, ShowingResult) => Some(VoteRecorded),
        (ShowingResult, Loading) => Some(Advance),
        (Loading | Displaying | ShowingResult, Failed) => Some(Fail),
        _ => None,
    }
}

#[must_use]
pub(crate) fn is_legal_transition(from: PhaseTag, edge: SessionEdge, to: PhaseTag) -> bool {
    use PhaseTag::{Displaying, Failed, Loading, ShowingResult};
    use SessionEdge::{Advance, Fail, ItemLoaded, RetryAfterInit, VoteRecorded};

    match edge {
        ItemLoaded => from == Loading && to == Displaying,
        RetryAfterInit => from == Loading && to == Loading,
        VoteRecorded => from == Displaying && to == ShowingResult,
        Advance => from == ShowingResult && to == Loading,
        Fail => from != Failed && to == Failed,
    }
}
