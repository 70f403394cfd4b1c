//! ttc-config
//!
//! YAML configuration for the sync layer, with a SHA-256 content hash
//! recorded at load time so logs can state exactly which config a
//! session ran under.
//!
//! The severity rank table lives here deliberately: the ordering of the
//! roster is an operational decision, not something inferred from label
//! spelling. A config that names an unknown category, or omits one,
//! fails to load.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ttc_schemas::TriageCategory;
use ttc_status::SeverityTable;

/// Reconnect backoff knobs for the change-feed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

/// Operator-facing configuration for a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Category → rank, lower sorts first. Must cover every category.
    pub severity_ranks: BTreeMap<TriageCategory, u8>,
    /// Known dispatch teams, offered as roster team filters.
    pub transport_teams: Vec<String>,
    /// Duration of the cosmetic "just updated" indicator.
    pub indicator_window_ms: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            severity_ranks: BTreeMap::from([
                (TriageCategory::Red, 0),
                (TriageCategory::Yellow, 1),
                (TriageCategory::Green, 2),
                (TriageCategory::Black, 3),
            ]),
            transport_teams: Vec::new(),
            indicator_window_ms: 2_000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl SyncConfig {
    /// The severity table for `ttc-status` ordering.
    pub fn severity_table(&self) -> SeverityTable {
        SeverityTable::new(self.severity_ranks.iter().map(|(c, r)| (*c, *r)))
    }

    fn validate(&self) -> Result<()> {
        for category in TriageCategory::ALL {
            if !self.severity_ranks.contains_key(&category) {
                bail!("severity_ranks missing category {category}");
            }
        }
        if self.reconnect.initial_backoff_ms == 0 {
            bail!("reconnect.initial_backoff_ms must be positive");
        }
        if self.reconnect.max_backoff_ms < self.reconnect.initial_backoff_ms {
            bail!("reconnect.max_backoff_ms must be >= initial_backoff_ms");
        }
        Ok(())
    }
}

/// A parsed config plus the hash of the bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: SyncConfig,
    /// Lowercase hex SHA-256 of the raw file contents.
    pub config_hash: String,
}

/// Load and validate a YAML config file.
pub fn load(path: &Path) -> Result<LoadedConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config file: {}", path.display()))?;
    let config: SyncConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("parse config yaml: {}", path.display()))?;
    config.validate()?;

    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config,
        config_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(yaml.as_bytes()).unwrap();
        f
    }

    #[test]
    fn default_config_validates_and_ranks_red_first() {
        let config = SyncConfig::default();
        config.validate().unwrap();
        let table = config.severity_table();
        assert!(table.is_complete());
        assert!(
            table.rank(TriageCategory::Red) < table.rank(TriageCategory::Black),
            "default priority is transport order, not label order"
        );
    }

    #[test]
    fn yaml_overrides_parse() {
        let f = write_config(
            "severity_ranks: { red: 0, yellow: 1, green: 2, black: 3 }\n\
             transport_teams: [Alpha, Bravo]\n\
             indicator_window_ms: 1500\n\
             reconnect: { initial_backoff_ms: 250, max_backoff_ms: 10000 }\n",
        );
        let loaded = load(f.path()).unwrap();
        assert_eq!(loaded.config.transport_teams, vec!["Alpha", "Bravo"]);
        assert_eq!(loaded.config.indicator_window_ms, 1500);
        assert_eq!(loaded.config.reconnect.initial_backoff_ms, 250);
        assert_eq!(loaded.config_hash.len(), 64);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let f = write_config("transport_teams: [Alpha]\n");
        let loaded = load(f.path()).unwrap();
        assert_eq!(loaded.config.indicator_window_ms, 2_000);
        assert!(loaded.config.severity_table().is_complete());
    }

    #[test]
    fn unknown_category_is_a_load_error() {
        let f = write_config("severity_ranks: { purple: 0 }\n");
        assert!(load(f.path()).is_err());
    }

    #[test]
    fn incomplete_rank_table_is_a_load_error() {
        let f = write_config("severity_ranks: { red: 0, yellow: 1 }\n");
        let err = load(f.path()).unwrap_err();
        assert!(err.to_string().contains("severity_ranks"), "{err}");
    }

    #[test]
    fn same_bytes_same_hash() {
        let yaml = "transport_teams: [Alpha]\n";
        let a = load(write_config(yaml).path()).unwrap();
        let b = load(write_config(yaml).path()).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }
}
