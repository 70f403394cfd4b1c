//! ttc-status
//!
//! Status reconciliation engine.
//!
//! Architectural decisions:
//! - Two raw status fields, one canonical read path ([`canonical_status`])
//! - The transport leg, once set, always wins over the legacy assignment
//! - Severity ordering is an explicit rank table, never string order
//!
//! Deterministic, pure logic. No IO. No clock.

mod canonical;
mod severity;

pub use canonical::{canonical_status, CanonicalStatus, CategoryCounts};
pub use severity::{roster_cmp, SeverityTable};
