//! Legal-transition enforcement and patch construction.

use chrono::{DateTime, Utc};
use ttc_schemas::{AssignmentStatus, LegStatus, TransportTag};
use ttc_status::{canonical_status, CanonicalStatus};
use ttc_store::TagPatch;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Returned when a requested transition is not legal from the tag's
/// current canonical status.
///
/// Callers surface this to the user action that triggered it and do not
/// retry; a fresh read of the tag is the only way forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    /// Canonical status the tag was in when the transition was requested.
    pub from: CanonicalStatus,
    /// Canonical status the transition would have produced.
    pub to: CanonicalStatus,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal transport transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// Caller-side admission failure on a freshly resolved tag.
///
/// The resolver stays a pure lookup; these business-rule checks run
/// afterwards, before any transition UI is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// No transport assignment yet — dispatch has not assigned a team.
    Unassigned,
    /// Canonical status is already terminal; the tag is read-only here.
    AlreadyTerminal(CanonicalStatus),
}

impl std::fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::Unassigned => write!(f, "tag has no transport assignment"),
            AdmissionError::AlreadyTerminal(s) => {
                write!(f, "tag is already terminal ({s})")
            }
        }
    }
}

impl std::error::Error for AdmissionError {}

// ---------------------------------------------------------------------------
// Admission check
// ---------------------------------------------------------------------------

/// Business-rule checks on a resolved tag before offering any action.
pub fn check_actionable(tag: &TransportTag) -> Result<(), AdmissionError> {
    let status = canonical_status(tag);
    if status.is_terminal() {
        return Err(AdmissionError::AlreadyTerminal(status));
    }
    if tag.transport_assignment.is_none() {
        return Err(AdmissionError::Unassigned);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// `Assigned → InProgress`.
///
/// Callers MUST route this through the confirm gate ([`crate::ConfirmSlot`]).
/// Requires a pre-existing assignment; dispatch creates assignments, this
/// core never does.
pub fn start_transport(
    tag: &TransportTag,
    now: DateTime<Utc>,
) -> Result<TagPatch, TransitionError> {
    let from = canonical_status(tag);
    if from != CanonicalStatus::Assigned {
        return Err(TransitionError {
            from,
            to: CanonicalStatus::InProgress,
        });
    }
    Ok(TagPatch {
        assignment_status: Some(AssignmentStatus::InProgress),
        transport_status: None,
        arrival_time: None,
        updated_at: now,
    })
}

/// `InProgress → Arrived`.
///
/// Single-step, no confirm gate. This is the only legal writer of
/// `transport.status`; once set it is never cleared.
pub fn mark_arrived(tag: &TransportTag, now: DateTime<Utc>) -> Result<TagPatch, TransitionError> {
    let from = canonical_status(tag);
    if from != CanonicalStatus::InProgress {
        return Err(TransitionError {
            from,
            to: CanonicalStatus::Arrived,
        });
    }
    Ok(TagPatch {
        assignment_status: None,
        transport_status: Some(LegStatus::Arrived),
        arrival_time: Some(now),
        updated_at: now,
    })
}
