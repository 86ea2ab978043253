//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Files are read with [`kwiz_fs::ConfigStore`], which picks
//! TOML, JSON or YAML from the extension.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// History retention caps; oldest entries are evicted first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_operations: usize,
    pub max_rollback_points: usize,
}

impl RetentionConfig {
    /// Smallest rollback point cap that still keeps both points of a smart
    /// sync that wrote both stores
    pub const MIN_ROLLBACK_POINTS: usize = 2;

    /// Reject caps that would evict the newest operation or its own points
    pub fn validate(&self) -> Result<()> {
        if self.max_operations < 1 {
            return Err(Error::validation("retention.max_operations must be at least 1"));
        }
        if self.max_rollback_points < Self::MIN_ROLLBACK_POINTS {
            return Err(Error::validation(format!(
                "retention.max_rollback_points must be at least {}, got {}",
                Self::MIN_ROLLBACK_POINTS,
                self.max_rollback_points
            )));
        }
        Ok(())
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_operations: 100,
            max_rollback_points: 10,
        }
    }
}

/// Age thresholds for classifying a store's data as fresh, stale or outdated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    pub fresh_secs: u64,
    pub stale_secs: u64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            fresh_secs: 5 * 60,
            stale_secs: 30 * 60,
        }
    }
}

impl FreshnessConfig {
    pub fn fresh(&self) -> Duration {
        Duration::from_secs(self.fresh_secs)
    }

    pub fn stale(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }
}

/// Coefficients of the duration estimate shown in previews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    pub base_ms: u64,
    pub per_change_ms: u64,
    /// Payload bytes processed per millisecond
    pub bytes_per_ms: u64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            base_ms: 100,
            per_change_ms: 50,
            bytes_per_ms: 10 * 1024,
        }
    }
}

impl EstimateConfig {
    pub fn estimate_ms(&self, changes: usize, payload_bytes: usize) -> u64 {
        let payload = (payload_bytes as u64)
            .checked_div(self.bytes_per_ms)
            .unwrap_or(0);
        self.per_change_ms
            .saturating_mul(changes as u64)
            .saturating_add(self.base_ms)
            .saturating_add(payload)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retention: RetentionConfig,
    pub freshness: FreshnessConfig,
    pub estimate: EstimateConfig,
}

impl EngineConfig {
    /// Load from a TOML, JSON or YAML file
    ///
    /// # Errors
    ///
    /// Returns a parse error for a malformed file and [`Error::Validation`]
    /// for out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = kwiz_fs::ConfigStore::new().load(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.retention.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.retention.max_operations, 100);
        assert_eq!(config.retention.max_rollback_points, 10);
        assert_eq!(config.freshness.fresh(), Duration::from_secs(300));
        assert_eq!(config.freshness.stale(), Duration::from_secs(1800));
    }

    #[test]
    fn estimate_follows_formula() {
        let estimate = EstimateConfig::default();
        assert_eq!(estimate.estimate_ms(0, 0), 100);
        assert_eq!(estimate.estimate_ms(3, 20 * 1024), 100 + 150 + 2);
    }

    #[test]
    fn zero_throughput_ignores_payload() {
        let estimate = EstimateConfig {
            bytes_per_ms: 0,
            ..EstimateConfig::default()
        };
        assert_eq!(estimate.estimate_ms(1, 1_000_000), 150);
    }

    #[test]
    fn estimate_saturates_instead_of_overflowing() {
        let estimate = EstimateConfig {
            per_change_ms: u64::MAX / 2,
            ..EstimateConfig::default()
        };
        assert_eq!(estimate.estimate_ms(3, 0), u64::MAX);
    }

    #[rstest]
    #[case(0, 10)]
    #[case(100, 0)]
    #[case(100, 1)]
    fn retention_below_minimum_is_rejected(
        #[case] max_operations: usize,
        #[case] max_rollback_points: usize,
    ) {
        let retention = RetentionConfig {
            max_operations,
            max_rollback_points,
        };
        assert!(matches!(retention.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn smallest_valid_retention_is_accepted() {
        let retention = RetentionConfig {
            max_operations: 1,
            max_rollback_points: 2,
        };
        assert!(retention.validate().is_ok());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn load_rejects_invalid_retention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kwiz.toml");
        std::fs::write(&path, "[retention]\nmax_rollback_points = 1\n").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(Error::Validation { .. })));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: EngineConfig = toml::from_str("[retention]\nmax_operations = 5\n").unwrap();
        assert_eq!(config.retention.max_operations, 5);
        assert_eq!(config.retention.max_rollback_points, 10);
        assert_eq!(config.estimate, EstimateConfig::default());
    }
}
