//! ttc-store
//!
//! Storage collaborator interfaces for the transport tag core.
//!
//! The core does not own a storage engine; it requires three narrow
//! capabilities from whatever backs it:
//!
//! 1. **Filtered, ordered reads** — [`TagReader`].
//! 2. **Partial writes that echo the stored row** — [`TagWriter`].
//! 3. **A table-wide change-notification subscription** — [`ChangeFeed`].
//!
//! `ttc-db` implements these against Postgres; `ttc-testkit` provides an
//! in-memory implementation for scenario tests. All trait methods are
//! native `async fn` and are used with static dispatch only.

use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use ttc_schemas::{AssignmentStatus, LegStatus, TransportTag};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failure at the storage edge.
///
/// Resolver and guard callers surface these to the user action that
/// triggered them; nothing in this core retries automatically. The sync
/// merger treats a feed failure as a reconnect trigger instead.
#[derive(Debug)]
pub enum StoreError {
    /// Backend unreachable or failed mid-operation.
    Unavailable(anyhow::Error),
    /// A stored row could not be decoded into the schema model.
    Decode(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "storage unavailable: {e}"),
            StoreError::Decode(e) => write!(f, "stored row decode failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Unavailable(e) | StoreError::Decode(e) => Some(e.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// TagPatch
// ---------------------------------------------------------------------------

/// Partial write against a single tag row.
///
/// Built exclusively by the transition guard (`ttc-guard`); the fields
/// it can touch are deliberately the only fields this core is allowed
/// to mutate. `updated_at` is mandatory on every patch — the stale-write
/// watermark in `ttc-sync` depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPatch {
    /// New legacy-field progress, if this patch advances it.
    pub assignment_status: Option<AssignmentStatus>,
    /// New transport-leg terminal status, if this patch sets it.
    /// A store must never let this clear or downgrade an already-set
    /// leg status.
    pub transport_status: Option<LegStatus>,
    /// Arrival timestamp, set together with `transport_status`.
    pub arrival_time: Option<DateTime<Utc>>,
    /// Write-time timestamp. Always present.
    pub updated_at: DateTime<Utc>,
}

impl TagPatch {
    /// Apply this patch to an in-memory row, mirroring what the backing
    /// store does on write. Used by the in-memory store and by the
    /// merger's optimistic local application.
    pub fn apply_to(&self, tag: &mut TransportTag) {
        if let Some(status) = self.assignment_status {
            if let Some(assignment) = tag.transport_assignment.as_mut() {
                assignment.status = Some(status);
                assignment.updated_at = Some(self.updated_at);
            }
        }
        if let Some(status) = self.transport_status {
            tag.transport.status = Some(status);
            tag.transport.arrival_time = self.arrival_time;
        }
        tag.updated_at = self.updated_at;
    }
}

// ---------------------------------------------------------------------------
// Change feed events
// ---------------------------------------------------------------------------

/// Kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One change notification: the kind plus the full post-change row
/// snapshot. The feed is table-wide; the merger filters client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub tag: TransportTag,
}

// ---------------------------------------------------------------------------
// Store traits
// ---------------------------------------------------------------------------

/// Read capabilities. Pure lookups; idempotent and safe to retry.
pub trait TagReader {
    /// Exact lookup by internal id.
    fn find_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<TransportTag>, StoreError>> + Send;

    /// Fallback lookup: `tag_number == token OR anonymous_id == token`,
    /// exact match. At most one row is expected.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<TransportTag>, StoreError>> + Send;

    /// All rows with a non-null transport assignment. Final filtering
    /// (terminal-status exclusion) and ordering are owned by `ttc-sync`.
    fn list_assigned(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<TransportTag>, StoreError>> + Send;
}

/// Write capability. The store must echo back the stored row, including
/// the `updated_at` it persisted.
pub trait TagWriter {
    fn apply_patch(
        &self,
        id: &Uuid,
        patch: &TagPatch,
    ) -> impl std::future::Future<Output = Result<TransportTag, StoreError>> + Send;
}

/// Change-notification capability.
pub trait ChangeFeed {
    /// The concrete event stream an implementation yields.
    type Events: Stream<Item = ChangeEvent> + Send + Unpin;

    /// Open a fresh subscription. Called again by the merger after a
    /// feed failure (reconnect with backoff).
    fn subscribe(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Events, StoreError>> + Send;
}
