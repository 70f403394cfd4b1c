//! Canonical status resolution.
//!
//! # Purpose
//!
//! A [`TransportTag`] expresses transport state across two overlapping
//! fields: the legacy `transport_assignment.status` progress field and
//! the newer `transport.status` terminal field. Both producers must be
//! read for backward compatibility, but only one is authoritative once
//! populated. [`canonical_status`] is the single point of truth for
//! every display and transition decision — it must never be duplicated
//! ad hoc elsewhere.
//!
//! # Invariants
//!
//! - **Total**: every tag maps to exactly one [`CanonicalStatus`].
//! - **Leg precedence**: if `transport.status` is set, the legacy field
//!   is ignored entirely.
//! - **Pure, no IO**: deterministic on the tag value alone.

use ttc_schemas::{AssignmentStatus, LegStatus, TransportTag, TriageCategory};

/// The single resolved transport state of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalStatus {
    /// Transport leg recorded as arrived. **Terminal.**
    Arrived,
    /// Legacy-equivalent terminal state. **Terminal.**
    Completed,
    /// Transport underway.
    InProgress,
    /// Team assigned, transport not started.
    Assigned,
    /// No assignment yet. Should not appear in any view that
    /// pre-filters to assigned records.
    Unknown,
}

impl CanonicalStatus {
    /// `true` when no further transition is permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CanonicalStatus::Arrived | CanonicalStatus::Completed)
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CanonicalStatus::Arrived => "arrived",
            CanonicalStatus::Completed => "completed",
            CanonicalStatus::InProgress => "in_progress",
            CanonicalStatus::Assigned => "assigned",
            CanonicalStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Resolve the two raw status fields to one canonical state.
///
/// Precedence, first match wins:
///
/// 1. `transport.status == Arrived` → `Arrived`
/// 2. `transport.status == Completed` → `Completed`
/// 3. `assignment.status == InProgress` → `InProgress`
/// 4. assignment present (status `Assigned` or legacy-unset) → `Assigned`
/// 5. otherwise → `Unknown`
pub fn canonical_status(tag: &TransportTag) -> CanonicalStatus {
    match tag.transport.status {
        Some(LegStatus::Arrived) => return CanonicalStatus::Arrived,
        Some(LegStatus::Completed) => return CanonicalStatus::Completed,
        None => {}
    }

    match &tag.transport_assignment {
        Some(assignment) => match assignment.status {
            Some(AssignmentStatus::InProgress) => CanonicalStatus::InProgress,
            // The legacy terminal marker on the assignment field alone:
            // written only by the old assignment-only code path.
            Some(AssignmentStatus::Completed) => CanonicalStatus::Completed,
            // Very old rows carry an assignment with no status at all.
            Some(AssignmentStatus::Assigned) | None => CanonicalStatus::Assigned,
        },
        None => CanonicalStatus::Unknown,
    }
}

/// Per-category roster statistics for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    pub total: usize,
    pub red: usize,
    pub yellow: usize,
    pub green: usize,
    pub black: usize,
}

impl CategoryCounts {
    /// Tally an iterator of tags.
    pub fn tally<'a, I: IntoIterator<Item = &'a TransportTag>>(tags: I) -> Self {
        let mut counts = CategoryCounts::default();
        for tag in tags {
            counts.total += 1;
            match tag.triage_category {
                TriageCategory::Red => counts.red += 1,
                TriageCategory::Yellow => counts.yellow += 1,
                TriageCategory::Green => counts.green += 1,
                TriageCategory::Black => counts.black += 1,
            }
        }
        counts
    }
}
