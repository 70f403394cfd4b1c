//! The notification-consumer loop.
//!
//! Single logical consumer per session: wakes on every inbound change
//! event, re-fetches the entire filtered set, and rebuilds the roster.
//! On feed failure it reconnects with capped exponential backoff; until
//! reconnected the roster is allowed to go stale rather than being
//! cleared.

use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use ttc_schemas::TransportTag;
use ttc_store::{ChangeFeed, StoreError, TagReader};

use crate::roster::TransportRoster;

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Capped exponential backoff for feed reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before the given reconnect attempt (0-based): doubles each
    /// attempt, capped at `max`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

// ---------------------------------------------------------------------------
// SyncMerger
// ---------------------------------------------------------------------------

/// Owns the roster and drives it from the change feed.
///
/// The store and feed are generic so scenario tests run against the
/// in-memory testkit store while production wires the Postgres adapter.
pub struct SyncMerger<S, F> {
    store: S,
    feed: F,
    roster: TransportRoster,
    backoff: BackoffPolicy,
}

impl<S, F> SyncMerger<S, F>
where
    S: TagReader,
    F: ChangeFeed,
{
    pub fn new(store: S, feed: F, roster: TransportRoster, backoff: BackoffPolicy) -> Self {
        Self {
            store,
            feed,
            roster,
            backoff,
        }
    }

    /// Read access to the visible set. The merger is the only writer.
    pub fn roster(&self) -> &TransportRoster {
        &self.roster
    }

    /// Full re-fetch of the filtered set and roster rebuild. Invoked on
    /// every inbound event regardless of which row it names, and once on
    /// every (re)subscribe to cover changes missed while disconnected.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let rows = self.store.list_assigned().await?;
        let fetched = rows.len();
        let stale = self.roster.rebuild(rows, Utc::now());
        if stale > 0 {
            debug!(fetched, stale, "discarded stale row snapshots on rebuild");
        }
        Ok(())
    }

    /// Record a locally-initiated write (the row echoed back by the
    /// store) so the view reflects it immediately and its delayed
    /// broadcast cannot regress the display.
    pub fn apply_local(&mut self, tag: TransportTag) {
        debug!(id = %tag.id, updated_at = %tag.updated_at, "applying local optimistic write");
        self.roster.apply_local(tag, Utc::now());
    }

    /// Consume the change feed until `shutdown` resolves.
    ///
    /// Subscribe failures and stream termination both fall into the
    /// backoff path; a successful subscribe resets the attempt counter.
    pub async fn run<Sd: std::future::Future<Output = ()>>(&mut self, shutdown: Sd) {
        tokio::pin!(shutdown);
        let mut attempt: u32 = 0;

        loop {
            match self.feed.subscribe().await {
                Ok(mut events) => {
                    info!("change feed subscribed");
                    attempt = 0;
                    if let Err(error) = self.refresh().await {
                        warn!(%error, "initial fetch after subscribe failed; roster kept stale");
                    }

                    loop {
                        tokio::select! {
                            _ = &mut shutdown => {
                                info!("sync merger shutting down");
                                return;
                            }
                            event = events.next() => match event {
                                Some(event) => {
                                    debug!(kind = ?event.kind, id = %event.tag.id, "change notification");
                                    if let Err(error) = self.refresh().await {
                                        warn!(%error, "re-fetch after notification failed; roster kept stale");
                                    }
                                }
                                None => {
                                    warn!("change feed ended; resubscribing");
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, attempt, "change feed subscribe failed");
                }
            }

            let delay = self.backoff.delay_for(attempt);
            attempt = attempt.saturating_add(1);
            tokio::select! {
                _ = &mut shutdown => {
                    info!("sync merger shutting down");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
