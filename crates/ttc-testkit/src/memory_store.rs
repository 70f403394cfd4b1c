//! In-memory tag store with race-simulation knobs.
//!
//! Implements all three `ttc-store` traits over a mutex-guarded map plus
//! a broadcast channel for the change feed. Two knobs let scenario tests
//! build the races the sync layer is designed around:
//!
//! - **Replication lag** — reads serve a frozen snapshot while writes
//!   keep landing in the truth map, imitating a read replica that has
//!   not caught up. The row echoed back by a write is always the truth.
//! - **Manual event injection** — [`MemoryTagStore::emit`] broadcasts an
//!   arbitrary event, such as a delayed stale snapshot.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use anyhow::anyhow;
use futures_util::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use ttc_schemas::TransportTag;
use ttc_store::{
    ChangeEvent, ChangeFeed, ChangeKind, StoreError, TagPatch, TagReader, TagWriter,
};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    rows: BTreeMap<Uuid, TransportTag>,
    /// Frozen read snapshot while replication lag is enabled.
    lagged: Option<BTreeMap<Uuid, TransportTag>>,
    /// Writes broadcast their post-change row unless disabled.
    auto_notify: bool,
    /// Remaining subscribe calls that should fail.
    failing_subscribes: u32,
}

/// Cloneable in-memory store; clones share state and feed.
#[derive(Clone)]
pub struct MemoryTagStore {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryTagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTagStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                auto_notify: true,
                ..Inner::default()
            })),
            events,
        }
    }

    /// Seed a row. Broadcasts an insert event when auto-notify is on.
    pub fn insert(&self, tag: TransportTag) {
        let event = {
            let mut inner = self.inner.lock().unwrap();
            inner.rows.insert(tag.id, tag.clone());
            inner.auto_notify.then_some(ChangeEvent {
                kind: ChangeKind::Insert,
                tag,
            })
        };
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
    }

    /// Broadcast an arbitrary event — the delayed-broadcast knob.
    pub fn emit(&self, event: ChangeEvent) {
        let _ = self.events.send(event);
    }

    /// Freeze reads at the current state; writes keep landing in truth.
    pub fn enable_replication_lag(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.lagged = Some(inner.rows.clone());
    }

    /// Catch reads up to truth again.
    pub fn flush_replication(&self) {
        self.inner.lock().unwrap().lagged = None;
    }

    /// Suppress automatic write broadcasts (tests then use [`emit`](Self::emit)).
    pub fn set_auto_notify(&self, enabled: bool) {
        self.inner.lock().unwrap().auto_notify = enabled;
    }

    /// Make the next `n` subscribe calls fail, for reconnect scenarios.
    pub fn fail_subscribes(&self, n: u32) {
        self.inner.lock().unwrap().failing_subscribes = n;
    }

    /// Current truth row, bypassing replication lag.
    pub fn truth(&self, id: &Uuid) -> Option<TransportTag> {
        self.inner.lock().unwrap().rows.get(id).cloned()
    }

    fn read_map<T>(&self, f: impl FnOnce(&BTreeMap<Uuid, TransportTag>) -> T) -> T {
        let inner = self.inner.lock().unwrap();
        match &inner.lagged {
            Some(snapshot) => f(snapshot),
            None => f(&inner.rows),
        }
    }
}

impl TagReader for MemoryTagStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TransportTag>, StoreError> {
        Ok(self.read_map(|rows| rows.get(id).cloned()))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TransportTag>, StoreError> {
        Ok(self.read_map(|rows| {
            rows.values()
                .find(|t| t.tag_number == token || t.anonymous_id == token)
                .cloned()
        }))
    }

    async fn list_assigned(&self) -> Result<Vec<TransportTag>, StoreError> {
        Ok(self.read_map(|rows| {
            rows.values()
                .filter(|t| t.transport_assignment.is_some())
                .cloned()
                .collect()
        }))
    }
}

impl TagWriter for MemoryTagStore {
    async fn apply_patch(&self, id: &Uuid, patch: &TagPatch) -> Result<TransportTag, StoreError> {
        let (stored, event) = {
            let mut inner = self.inner.lock().unwrap();
            let row = inner
                .rows
                .get_mut(id)
                .ok_or_else(|| StoreError::Unavailable(anyhow!("no row with id {id}")))?;

            // Store-level write-once protection on the transport leg,
            // mirroring the Postgres adapter: a second terminal write
            // cannot clear or downgrade the first.
            let mut effective = patch.clone();
            if row.transport.status.is_some() {
                effective.transport_status = None;
                effective.arrival_time = None;
            }
            effective.apply_to(row);

            let stored = row.clone();
            let event = inner.auto_notify.then_some(ChangeEvent {
                kind: ChangeKind::Update,
                tag: stored.clone(),
            });
            (stored, event)
        };
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
        Ok(stored)
    }
}

impl ChangeFeed for MemoryTagStore {
    type Events = MemoryFeedStream;

    async fn subscribe(&self) -> Result<Self::Events, StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.failing_subscribes > 0 {
                inner.failing_subscribes -= 1;
                return Err(StoreError::Unavailable(anyhow!(
                    "subscribe refused (test knob)"
                )));
            }
        }
        Ok(MemoryFeedStream {
            inner: BroadcastStream::new(self.events.subscribe()),
        })
    }
}

/// Broadcast receiver adapted to a plain event stream. Lagged markers
/// are skipped: the merger re-fetches the whole set on every event, so
/// dropped intermediate events cost nothing.
pub struct MemoryFeedStream {
    inner: BroadcastStream<ChangeEvent>,
}

impl Stream for MemoryFeedStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(_)))) => continue,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
