//! ttc-sync
//!
//! Realtime sync merger: keeps a local, filtered, ordered view of the
//! assigned transport tags consistent against (a) a table-wide change
//! notification stream and (b) locally-applied optimistic writes.
//!
//! Architectural decisions:
//! - Full re-fetch of the filtered set on every notification. The sort
//!   key and filter predicate can change a row's membership as a side
//!   effect of an unrelated field write, so patching the single changed
//!   row risks stale set membership. At dozens of concurrently active
//!   tags the redundant reads are cheap; the contract is what matters.
//! - Per-record `updated_at` watermark. A snapshot is allowed to
//!   override local state only when strictly newer than the newest
//!   write already applied locally for that record.
//! - The roster is owned exclusively by the merger. Guard and resolver
//!   issue writes to the store and rely on the feed (or an explicit
//!   optimistic application, itself watermarked) to update the view.

mod merger;
mod roster;
mod watermark;

pub use merger::{BackoffPolicy, SyncMerger};
pub use roster::{RosterFilter, TransportRoster};
pub use watermark::{SnapshotFreshness, TagWatermark};
