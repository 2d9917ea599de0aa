//! Configuration types for grouping and placement planning.
//!
//! Plain builder-style structs, free of any CLI framework. The three
//! historical grouping scripts differed only in policy; here the policy is a
//! value on [`GroupingConfig`] and one segmenter serves all three.
//!
//! # Example
//!
//! ```rust
//! use chatblock::config::{GroupingConfig, GroupingPolicy};
//!
//! let config = GroupingConfig::new(GroupingPolicy::Continuity)
//!     .with_tolerance_minutes(5);
//! assert_eq!(config.tolerance_minutes, 5);
//! ```

use serde::{Deserialize, Serialize};

/// The interchangeable grouping policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingPolicy {
    /// Media from the same author within the tolerance window stays in one
    /// block; time or author gaps close blocks. No divider concept.
    Continuity,
    /// Like continuity, but an empty-content message is an explicit divider
    /// that unconditionally closes the open block.
    BlankLine,
    /// Divider-delimited blocks keyed by a single protocol number; blocks
    /// sharing a protocol are fused across time and authorship in a
    /// post-pass.
    ProtocolMerge,
}

/// Configuration for the block segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Which grouping policy drives the scan.
    pub policy: GroupingPolicy,

    /// Maximum gap in minutes between a block's last media and a candidate
    /// continuation before a new block is forced (default: 2).
    ///
    /// Ignored by [`GroupingPolicy::ProtocolMerge`], which relies on dividers
    /// and author changes instead of a time window.
    pub tolerance_minutes: u32,

    /// Gap threshold in minutes above which a merge or continuation is still
    /// performed but flagged with a `intervalo_grande` alert (default: 30).
    pub interval_alert_minutes: u32,
}

impl GroupingConfig {
    /// Creates a configuration for the given policy with default thresholds.
    pub fn new(policy: GroupingPolicy) -> Self {
        Self {
            policy,
            tolerance_minutes: 2,
            interval_alert_minutes: 30,
        }
    }

    /// Continuity policy with default thresholds.
    pub fn continuity() -> Self {
        Self::new(GroupingPolicy::Continuity)
    }

    /// Blank-line policy with default thresholds.
    pub fn blank_line() -> Self {
        Self::new(GroupingPolicy::BlankLine)
    }

    /// Protocol-merge policy with default thresholds.
    pub fn protocol_merge() -> Self {
        Self::new(GroupingPolicy::ProtocolMerge)
    }

    /// Sets the continuation tolerance window.
    #[must_use]
    pub fn with_tolerance_minutes(mut self, minutes: u32) -> Self {
        self.tolerance_minutes = minutes;
        self
    }

    /// Sets the large-interval alert threshold.
    #[must_use]
    pub fn with_interval_alert_minutes(mut self, minutes: u32) -> Self {
        self.interval_alert_minutes = minutes;
        self
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self::continuity()
    }
}

/// Configuration for the placement planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Name of the isolation folder for blocks without a usable caption
    /// (default: `sem_legenda`).
    pub isolation_folder: String,

    /// Minimum photo count expected in each valid-protocol folder; fewer
    /// raises a `poucas_fotos` alert (default: 3).
    pub min_photos_per_protocol: usize,
}

impl PlacementConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the isolation folder name.
    #[must_use]
    pub fn with_isolation_folder(mut self, name: impl Into<String>) -> Self {
        self.isolation_folder = name.into();
        self
    }

    /// Sets the minimum expected photo count per protocol folder.
    #[must_use]
    pub fn with_min_photos_per_protocol(mut self, count: usize) -> Self {
        self.min_photos_per_protocol = count;
        self
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            isolation_folder: "sem_legenda".to_string(),
            min_photos_per_protocol: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_defaults() {
        let config = GroupingConfig::continuity();
        assert_eq!(config.policy, GroupingPolicy::Continuity);
        assert_eq!(config.tolerance_minutes, 2);
        assert_eq!(config.interval_alert_minutes, 30);
    }

    #[test]
    fn test_grouping_builder() {
        let config = GroupingConfig::protocol_merge()
            .with_tolerance_minutes(10)
            .with_interval_alert_minutes(60);

        assert_eq!(config.policy, GroupingPolicy::ProtocolMerge);
        assert_eq!(config.tolerance_minutes, 10);
        assert_eq!(config.interval_alert_minutes, 60);
    }

    #[test]
    fn test_placement_defaults() {
        let config = PlacementConfig::default();
        assert_eq!(config.isolation_folder, "sem_legenda");
        assert_eq!(config.min_photos_per_protocol, 3);
    }

    #[test]
    fn test_policy_serializes_snake_case() {
        let json = serde_json::to_string(&GroupingPolicy::ProtocolMerge).unwrap();
        assert_eq!(json, "\"protocol_merge\"");
    }
}
