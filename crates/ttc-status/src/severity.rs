//! Severity rank table and roster ordering.
//!
//! The original console ordered the visible list by the raw category
//! label using the storage engine's default ascending string compare,
//! which puts `black` ahead of `red`. That ordering was never a triage
//! decision — it fell out of the label spelling. The rank table below
//! makes the ordering an explicit configuration value instead: lower
//! rank sorts first, and the default table follows transport priority
//! (immediate casualties first, deceased last).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ttc_schemas::{TransportTag, TriageCategory};

/// Explicit category → rank mapping used as the primary roster sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTable {
    ranks: BTreeMap<TriageCategory, u8>,
}

impl Default for SeverityTable {
    /// Transport priority order: red, yellow, green, black.
    fn default() -> Self {
        Self::new([
            (TriageCategory::Red, 0),
            (TriageCategory::Yellow, 1),
            (TriageCategory::Green, 2),
            (TriageCategory::Black, 3),
        ])
    }
}

impl SeverityTable {
    pub fn new<I: IntoIterator<Item = (TriageCategory, u8)>>(ranks: I) -> Self {
        Self {
            ranks: ranks.into_iter().collect(),
        }
    }

    /// Rank for a category. Categories missing from the table sort last;
    /// the config loader rejects incomplete tables, so this only matters
    /// for hand-built tables in tests.
    pub fn rank(&self, category: TriageCategory) -> u8 {
        self.ranks.get(&category).copied().unwrap_or(u8::MAX)
    }

    /// `true` when every category has an explicit rank.
    pub fn is_complete(&self) -> bool {
        TriageCategory::ALL
            .iter()
            .all(|c| self.ranks.contains_key(c))
    }
}

/// Roster ordering: severity rank ascending, then `created_at` ascending
/// (FIFO within the same severity), then id as a deterministic tiebreak.
pub fn roster_cmp(table: &SeverityTable, a: &TransportTag, b: &TransportTag) -> Ordering {
    table
        .rank(a.triage_category)
        .cmp(&table.rank(b.triage_category))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
