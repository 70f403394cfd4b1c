//! Per-record stale-write watermark.
//!
//! # Purpose
//!
//! A change notification can arrive carrying a row snapshot older than a
//! write this session has already applied locally — a broadcast delayed
//! in transit, or the echo of our own write racing a newer one. Showing
//! it would regress the display. This module tracks the newest
//! `updated_at` applied per record and rejects anything not strictly
//! newer.
//!
//! # Invariants
//!
//! - **Strict monotonicity**: a snapshot is fresh only when its
//!   `updated_at` is strictly greater than the watermark for that id;
//!   an equal timestamp is the same write and carries nothing new.
//! - **First sight is fresh**: records without a watermark entry accept
//!   any snapshot.
//! - **Watermark advances only on acceptance**: rejections never move it.
//! - **Pure, no IO**: the caller owns the clock and the consequences.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Result of checking a row snapshot against the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFreshness {
    /// Strictly newer than anything applied for this record.
    Fresh,
    /// Older than or equal to a write already applied locally.
    /// Discarded for display; a designed-for race, not a fault.
    Stale {
        /// Newest `updated_at` applied for this record.
        watermark: DateTime<Utc>,
        /// The rejected snapshot's `updated_at`.
        got: DateTime<Utc>,
    },
}

impl SnapshotFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SnapshotFreshness::Fresh)
    }
}

/// Tracks the newest applied `updated_at` per record id.
#[derive(Debug, Clone, Default)]
pub struct TagWatermark {
    applied: BTreeMap<Uuid, DateTime<Utc>>,
}

impl TagWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freshness probe without advancing the watermark.
    pub fn check(&self, id: &Uuid, updated_at: DateTime<Utc>) -> SnapshotFreshness {
        match self.applied.get(id) {
            Some(&watermark) if updated_at <= watermark => SnapshotFreshness::Stale {
                watermark,
                got: updated_at,
            },
            _ => SnapshotFreshness::Fresh,
        }
    }

    /// Check freshness and advance the watermark when fresh.
    pub fn accept(&mut self, id: &Uuid, updated_at: DateTime<Utc>) -> SnapshotFreshness {
        let result = self.check(id, updated_at);
        if result.is_fresh() {
            self.applied.insert(*id, updated_at);
        }
        result
    }

    /// Newest applied `updated_at` for a record, if any write was seen.
    pub fn last_applied(&self, id: &Uuid) -> Option<DateTime<Utc>> {
        self.applied.get(id).copied()
    }
}
