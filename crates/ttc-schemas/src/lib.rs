//! ttc-schemas
//!
//! Shared serde data model for the transport tag tracking core.
//!
//! A [`TransportTag`] carries its transport state across two overlapping
//! fields for historical reasons:
//!
//! - [`TransportTag::transport_assignment`] — the legacy progress field,
//!   written by the dispatch process and by the transition guard.
//! - [`TransportTag::transport`] — the newer field, authoritative for the
//!   terminal "reached destination" fact. Write-once: never cleared or
//!   downgraded after it is set.
//!
//! Resolution of the two fields into one canonical state lives in
//! `ttc-status`; nothing in this crate interprets status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final triage category of a tag. Closed set; assigned by the triage
/// process before the tag reaches this core and immutable here.
///
/// The on-wire labels are the original lowercase colour names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageCategory {
    /// Immediate / critical.
    Red,
    /// Urgent / serious.
    Yellow,
    /// Delayed / minor.
    Green,
    /// Deceased or expectant.
    Black,
}

impl TriageCategory {
    /// All categories, in canonical declaration order.
    pub const ALL: [TriageCategory; 4] = [
        TriageCategory::Red,
        TriageCategory::Yellow,
        TriageCategory::Green,
        TriageCategory::Black,
    ];

    /// The lowercase wire label (`"red"`, `"yellow"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageCategory::Red => "red",
            TriageCategory::Yellow => "yellow",
            TriageCategory::Green => "green",
            TriageCategory::Black => "black",
        }
    }
}

impl std::fmt::Display for TriageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the legacy assignment field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// A transport team has been assigned; transport not yet started.
    Assigned,
    /// Transport is underway.
    InProgress,
    /// Legacy terminal marker, written only by the old assignment-only
    /// code path. Treated as equivalent to an arrived transport leg.
    Completed,
}

impl AssignmentStatus {
    /// The snake_case wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }
}

/// Legacy transport-assignment sub-record. Created by the external
/// dispatch process; this core only ever advances `status` and
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportAssignment {
    /// Dispatch team name (e.g. `"Alpha"`).
    pub team: String,
    /// Missing on very old rows; absent means `Assigned`.
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Terminal state of the transport leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    /// Reached the destination aid station.
    Arrived,
    /// Legacy spelling of the same terminal fact.
    Completed,
}

impl LegStatus {
    /// The snake_case wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            LegStatus::Arrived => "arrived",
            LegStatus::Completed => "completed",
        }
    }
}

/// The authoritative transport-leg sub-record. `status == None` means
/// the terminal fact has not been recorded; once `Some`, it is never
/// cleared or downgraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransportLeg {
    #[serde(default)]
    pub status: Option<LegStatus>,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
}

/// The tracked casualty/cargo record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportTag {
    /// Stable identity. Immutable, assigned at creation.
    pub id: Uuid,
    /// Human-facing tag number (e.g. `"T-2025-001"`). Lookup only.
    pub tag_number: String,
    /// Human-facing anonymous patient id (e.g. `"ANON-123456"`). Lookup only.
    pub anonymous_id: String,
    pub triage_category: TriageCategory,
    /// Legacy progress field. `None` until the dispatch process assigns
    /// a team.
    #[serde(default)]
    pub transport_assignment: Option<TransportAssignment>,
    /// Authoritative terminal field.
    #[serde(default)]
    pub transport: TransportLeg,
    pub created_at: DateTime<Utc>,
    /// Last-write timestamp. Monotonically non-decreasing per record;
    /// the stale-write watermark in `ttc-sync` keys off this.
    pub updated_at: DateTime<Utc>,
}

impl TransportTag {
    /// The assigned team name, if dispatched.
    pub fn team(&self) -> Option<&str> {
        self.transport_assignment.as_ref().map(|a| a.team.as_str())
    }
}
