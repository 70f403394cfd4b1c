//! ttc-resolve
//!
//! Identifier resolution: turn a raw scanned or typed string into
//! exactly one [`TransportTag`](ttc_schemas::TransportTag) or a typed
//! failure.
//!
//! Purely a read path — no side effects, idempotent, safe to retry.
//! Business-rule checks on the resolved tag (`Unassigned`,
//! `AlreadyTerminal`) belong to the caller via
//! `ttc-guard::check_actionable`, so the resolver stays a pure lookup.

mod resolver;
mod scan;

pub use resolver::{resolve, ResolveError};
pub use scan::decode_scan_token;
