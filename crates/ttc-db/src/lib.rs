//! ttc-db
//!
//! Postgres adapter for the tag store traits: filtered reads, patch
//! writes that echo the stored row, and a LISTEN/NOTIFY change feed
//! carrying full post-change row snapshots.
//!
//! Shape follows the rest of the workspace's storage convention: free
//! async functions over a `PgPool` for each query, with thin
//! [`PgTagStore`] / [`PgChangeFeed`] wrappers implementing the
//! `ttc-store` traits on top of them.

use anyhow::{anyhow, Context, Result};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use sqlx::postgres::{PgListener, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::warn;
use ttc_schemas::{TransportAssignment, TransportLeg, TransportTag, TriageCategory};
use ttc_store::{ChangeEvent, ChangeFeed, StoreError, TagPatch, TagReader, TagWriter};
use uuid::Uuid;

pub const ENV_DB_URL: &str = "TTC_DATABASE_URL";

/// Channel the row-change trigger notifies on.
pub const CHANGE_CHANNEL: &str = "transport_tags_changed";

/// Connect to Postgres using TTC_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

const TAG_COLUMNS: &str = "id, tag_number, anonymous_id, triage_category, \
     transport_assignment, transport, created_at, updated_at";

fn row_to_tag(row: &PgRow) -> Result<TransportTag> {
    let category: String = row.try_get("triage_category")?;
    let triage_category: TriageCategory =
        serde_json::from_value(serde_json::Value::String(category.clone()))
            .map_err(|_| anyhow!("unknown triage category {category:?}"))?;

    let assignment: Option<serde_json::Value> = row.try_get("transport_assignment")?;
    let transport_assignment: Option<TransportAssignment> = assignment
        .map(serde_json::from_value)
        .transpose()
        .context("decode transport_assignment jsonb")?;

    let leg: serde_json::Value = row.try_get("transport")?;
    let transport: TransportLeg =
        serde_json::from_value(leg).context("decode transport jsonb")?;

    Ok(TransportTag {
        id: row.try_get("id")?,
        tag_number: row.try_get("tag_number")?,
        anonymous_id: row.try_get("anonymous_id")?,
        triage_category,
        transport_assignment,
        transport,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Exact lookup by internal id.
pub async fn find_by_id(pool: &PgPool, id: &Uuid) -> Result<Option<TransportTag>> {
    let row = sqlx::query(&format!(
        "select {TAG_COLUMNS} from transport_tags where id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("find_by_id query failed")?;

    row.as_ref().map(row_to_tag).transpose()
}

/// Fallback lookup: tag_number or anonymous_id, exact match.
pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<TransportTag>> {
    let row = sqlx::query(&format!(
        "select {TAG_COLUMNS} from transport_tags \
         where tag_number = $1 or anonymous_id = $1"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("find_by_token query failed")?;

    row.as_ref().map(row_to_tag).transpose()
}

/// All rows with a transport assignment, oldest first. Final ordering
/// and terminal-status filtering happen client-side in `ttc-sync`.
pub async fn list_assigned(pool: &PgPool) -> Result<Vec<TransportTag>> {
    let rows = sqlx::query(&format!(
        "select {TAG_COLUMNS} from transport_tags \
         where transport_assignment is not null \
         order by created_at asc"
    ))
    .fetch_all(pool)
    .await
    .context("list_assigned query failed")?;

    rows.iter().map(row_to_tag).collect()
}

/// Apply a guard-built patch and echo the stored row.
///
/// Leg write-once is enforced here as well as in the guard: the transport
/// leg column is only written when its status is still null, so a racing
/// second writer can never clear or downgrade a terminal leg.
pub async fn apply_patch(pool: &PgPool, id: &Uuid, patch: &TagPatch) -> Result<TransportTag> {
    let assignment_status = patch.assignment_status.map(|s| s.as_str());
    let leg_status = patch.transport_status.map(|s| s.as_str());

    let row = sqlx::query(&format!(
        r#"
        update transport_tags set
          transport_assignment = case
            when $2::text is null or transport_assignment is null
              then transport_assignment
            else transport_assignment
              || jsonb_build_object('status', $2::text, 'updated_at', $3::timestamptz)
          end,
          transport = case
            when $4::text is null or transport->>'status' is not null
              then transport
            else transport
              || jsonb_build_object('status', $4::text, 'arrival_time', $5::timestamptz)
          end,
          updated_at = $3
        where id = $1
        returning {TAG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(assignment_status)
    .bind(patch.updated_at)
    .bind(leg_status)
    .bind(patch.arrival_time)
    .fetch_optional(pool)
    .await
    .context("apply_patch update failed")?;

    match row {
        Some(row) => row_to_tag(&row),
        None => Err(anyhow!("no transport_tags row with id {id}")),
    }
}

/// Decode one NOTIFY payload into a change event.
///
/// Kept separate from the listener wiring so the trigger's payload
/// contract is unit-testable without a database.
pub fn decode_notification(payload: &str) -> Result<ChangeEvent> {
    serde_json::from_str(payload).context("decode change notification payload")
}

// ---------------------------------------------------------------------------
// Store trait implementations
// ---------------------------------------------------------------------------

fn unavailable(e: anyhow::Error) -> StoreError {
    StoreError::Unavailable(e)
}

/// `ttc-store` trait surface over a connection pool.
#[derive(Clone)]
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TagReader for PgTagStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<TransportTag>, StoreError> {
        find_by_id(&self.pool, id).await.map_err(unavailable)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<TransportTag>, StoreError> {
        find_by_token(&self.pool, token).await.map_err(unavailable)
    }

    async fn list_assigned(&self) -> Result<Vec<TransportTag>, StoreError> {
        list_assigned(&self.pool).await.map_err(unavailable)
    }
}

impl TagWriter for PgTagStore {
    async fn apply_patch(&self, id: &Uuid, patch: &TagPatch) -> Result<TransportTag, StoreError> {
        apply_patch(&self.pool, id, patch).await.map_err(unavailable)
    }
}

/// LISTEN/NOTIFY subscription on the row-change channel.
///
/// Each `subscribe` call opens a fresh listener connection, so the sync
/// merger's reconnect-with-backoff loop maps directly onto it. Payloads
/// that fail to decode are logged and skipped rather than tearing down
/// the stream; NOTIFY payloads are bounded (8 kB) but tag rows sit far
/// under that.
#[derive(Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
}

impl PgChangeFeed {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ChangeFeed for PgChangeFeed {
    type Events = BoxStream<'static, ChangeEvent>;

    async fn subscribe(&self) -> Result<Self::Events, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .context("open change-feed listener")
            .map_err(unavailable)?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .context("listen on change channel")
            .map_err(unavailable)?;

        let stream = listener
            .into_stream()
            .filter_map(|notification| async {
                match notification {
                    Ok(n) => match decode_notification(n.payload()) {
                        Ok(event) => Some(event),
                        Err(error) => {
                            warn!(%error, "skipping undecodable change notification");
                            None
                        }
                    },
                    Err(error) => {
                        // PgListener reconnects internally; notifications
                        // during the gap are lost, which the merger's
                        // refresh-on-resubscribe semantics tolerate.
                        warn!(%error, "change-feed listener error");
                        None
                    }
                }
            })
            .boxed();

        Ok(stream)
    }
}
