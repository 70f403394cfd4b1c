//! Two-stage tag lookup.

use ttc_schemas::TransportTag;
use ttc_store::{StoreError, TagReader};
use uuid::Uuid;

/// Resolution failure. Terminal for the user action that triggered it —
/// re-scanning is an explicit new action, never an automatic retry.
#[derive(Debug)]
pub enum ResolveError {
    /// The token was empty after trimming.
    EmptyIdentifier,
    /// Neither the primary nor the fallback lookup matched.
    NotFound(String),
    /// Storage failed before a verdict could be reached.
    Storage(StoreError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::EmptyIdentifier => write!(f, "scan produced an empty identifier"),
            ResolveError::NotFound(token) => write!(f, "no tag matches token {token:?}"),
            ResolveError::Storage(e) => write!(f, "lookup failed: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq for ResolveError {
    /// Storage failures compare by discriminant only; the wrapped error
    /// carries no equality.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolveError::EmptyIdentifier, ResolveError::EmptyIdentifier) => true,
            (ResolveError::NotFound(a), ResolveError::NotFound(b)) => a == b,
            (ResolveError::Storage(_), ResolveError::Storage(_)) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        ResolveError::Storage(e)
    }
}

/// Resolve a raw scan string to exactly one tag.
///
/// Primary lookup is by internal id (tokens that parse as a UUID);
/// on miss the fallback matches `tag_number` or `anonymous_id` exactly.
pub async fn resolve<S: TagReader>(store: &S, raw: &str) -> Result<TransportTag, ResolveError> {
    let token = crate::decode_scan_token(raw)?;

    if let Ok(id) = Uuid::parse_str(&token) {
        if let Some(tag) = store.find_by_id(&id).await? {
            return Ok(tag);
        }
    }

    match store.find_by_token(&token).await? {
        Some(tag) => Ok(tag),
        None => Err(ResolveError::NotFound(token)),
    }
}
