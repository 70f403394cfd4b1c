//! The visible transport roster.
//!
//! Owns the set of tags a transport-team session sees: assignment
//! present, canonical status not terminal, ordered by severity rank then
//! creation time. Rebuilt from a full re-fetch on every change
//! notification; stale snapshots never overwrite newer local state.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use ttc_schemas::{TransportTag, TriageCategory};
use ttc_status::{canonical_status, roster_cmp, CategoryCounts, SeverityTable};
use uuid::Uuid;

use crate::watermark::TagWatermark;

/// Optional view filters, supplementing the base roster predicate.
/// Both default to "show everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    pub category: Option<TriageCategory>,
    pub team: Option<String>,
}

impl RosterFilter {
    fn matches(&self, tag: &TransportTag) -> bool {
        if let Some(category) = self.category {
            if tag.triage_category != category {
                return false;
            }
        }
        if let Some(team) = self.team.as_deref() {
            if tag.team() != Some(team) {
                return false;
            }
        }
        true
    }
}

/// Locally-held roster state.
///
/// `known` holds every row the roster has accepted, including rows that
/// are currently invisible (terminal, or filtered out); keeping them lets
/// a stale snapshot be answered with the newer local copy even when that
/// copy is not displayed.
#[derive(Debug, Clone)]
pub struct TransportRoster {
    severity: SeverityTable,
    watermark: TagWatermark,
    known: BTreeMap<Uuid, TransportTag>,
    indicator_window: Duration,
    last_merge_at: Option<DateTime<Utc>>,
}

impl TransportRoster {
    pub fn new(severity: SeverityTable, indicator_window: Duration) -> Self {
        Self {
            severity,
            watermark: TagWatermark::new(),
            known: BTreeMap::new(),
            indicator_window,
            last_merge_at: None,
        }
    }

    /// Replace the roster from a full filtered re-fetch.
    ///
    /// Rows whose snapshot is stale under the watermark keep the
    /// previously applied local copy; rows absent from the fetch drop
    /// out (the re-fetch is authoritative for set membership). Returns
    /// the number of stale snapshots actually discarded in favour of
    /// differing local state, for logging. A re-fetch of unchanged rows
    /// re-serves the same snapshots at the same `updated_at`; those are
    /// echoes, not discards, and do not count.
    pub fn rebuild<I: IntoIterator<Item = TransportTag>>(
        &mut self,
        rows: I,
        now: DateTime<Utc>,
    ) -> usize {
        let mut next = BTreeMap::new();
        let mut stale = 0usize;

        for row in rows {
            let id = row.id;
            if self.watermark.accept(&id, row.updated_at).is_fresh() {
                next.insert(id, row);
            } else if let Some(local) = self.known.remove(&id) {
                if local != row {
                    stale += 1;
                }
                next.insert(id, local);
            } else {
                // Stale snapshot for a row no longer held locally (it
                // dropped out of an earlier fetch): nothing to show.
                stale += 1;
            }
        }

        self.known = next;
        self.last_merge_at = Some(now);
        stale
    }

    /// Apply a locally-initiated optimistic write (the row echoed back
    /// by the store). Advances the watermark so the eventual broadcast
    /// of this same write, or anything older, is discarded.
    pub fn apply_local(&mut self, tag: TransportTag, now: DateTime<Utc>) {
        self.watermark.accept(&tag.id, tag.updated_at);
        self.known.insert(tag.id, tag);
        self.last_merge_at = Some(now);
    }

    /// The displayed set: assignment present, non-terminal, ordered by
    /// severity rank ascending then `created_at` ascending.
    pub fn visible(&self) -> Vec<&TransportTag> {
        self.visible_filtered(&RosterFilter::default())
    }

    /// [`visible`](Self::visible) narrowed by category/team view filters.
    pub fn visible_filtered(&self, filter: &RosterFilter) -> Vec<&TransportTag> {
        let mut rows: Vec<&TransportTag> = self
            .known
            .values()
            .filter(|t| t.transport_assignment.is_some())
            .filter(|t| !canonical_status(t).is_terminal())
            .filter(|t| filter.matches(t))
            .collect();
        rows.sort_by(|a, b| roster_cmp(&self.severity, a, b));
        rows
    }

    /// Per-category statistics over the currently visible set.
    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts::tally(self.visible().into_iter())
    }

    /// A record as currently held, visible or not.
    pub fn get(&self, id: &Uuid) -> Option<&TransportTag> {
        self.known.get(id)
    }

    /// Cosmetic "just updated" indicator: true for the configured window
    /// after the last merge. No correctness obligation.
    pub fn recently_updated(&self, now: DateTime<Utc>) -> bool {
        self.last_merge_at
            .is_some_and(|at| now - at <= self.indicator_window)
    }
}
