//! Shuffle descriptors and the exchange placement policy.
//!
//! A distributed `GROUP BY` runs as two physical stages (partial, then
//! final) with exactly one hash shuffle between workers. The session's
//! shuffle mode picks where that shuffle sits; both placements are
//! correct, the choice trades raw-row network volume against worker-local
//! aggregation-state memory.

use std::fmt;
use std::str::FromStr;

use osprey_common::error::{OspreyError, PlannerError};
use osprey_common::settings::{Settings, GROUP_BY_SHUFFLE_MODE};
use serde::{Deserialize, Serialize};

use crate::expr::ColumnRef;

/// Rendered name of the derived composite shuffle key used by
/// key-shuffling. The hash-combination of the group-by columns behind it
/// is an executor concern; the planner only needs the stable identity.
pub const SYNTHETIC_GROUP_KEY: &str = "_group_by_key";

/// Where rows are hash-partitioned relative to the aggregation stages.
///
/// - `BeforePartial`: shuffle every raw row by the original group-by
///   column(s) before any aggregation. Minimal worker-local state, full
///   raw-row network volume.
/// - `BeforeMerge`: aggregate locally first, then shuffle one partial
///   state per distinct group per worker by a derived key. Reduced
///   network volume at the cost of the synthetic-key computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    BeforePartial,
    BeforeMerge,
}

impl ShuffleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShuffleMode::BeforePartial => "before_partial",
            ShuffleMode::BeforeMerge => "before_merge",
        }
    }

    /// Read the session's shuffle mode. Called once per plan build; an
    /// unrecognized value is a configuration error, never defaulted.
    pub fn from_settings(settings: &Settings) -> Result<Self, OspreyError> {
        let value = settings
            .get(GROUP_BY_SHUFFLE_MODE)
            .unwrap_or_else(|| ShuffleMode::BeforePartial.as_str().to_string());
        Ok(value.parse()?)
    }
}

impl FromStr for ShuffleMode {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before_partial" => Ok(ShuffleMode::BeforePartial),
            "before_merge" => Ok(ShuffleMode::BeforeMerge),
            other => Err(PlannerError::UnsupportedConfiguration(format!(
                "unknown {} value: {:?} (expected before_partial or before_merge)",
                GROUP_BY_SHUFFLE_MODE, other
            ))),
        }
    }
}

impl fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The key a hash exchange partitions rows by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashKey {
    /// The original group-by column(s), each independently addressable
    /// (whole-row shuffling).
    Columns(Vec<ColumnRef>),
    /// A single derived pseudo-column combining all group-by columns
    /// (key-shuffling).
    Synthetic,
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Columns(cols) => {
                let cols: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
                f.write_str(&cols.join(", "))
            }
            HashKey::Synthetic => f.write_str(SYNTHETIC_GROUP_KEY),
        }
    }
}

/// What an exchange node does at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExchangeKind {
    /// Gather all worker streams into one coordinator-visible stream.
    /// Always the outermost node of a distributed plan.
    Merge,
    /// Partition rows across workers by a hash of the key.
    Hash(HashKey),
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeKind::Merge => f.write_str("Merge"),
            ExchangeKind::Hash(key) => write!(f, "Hash({})", key),
        }
    }
}

/// Where the hash shuffle sits in the stage chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShufflePosition {
    /// Above the raw input, below the partial aggregation.
    AboveInput,
    /// Above the partial aggregation, below the final aggregation.
    AbovePartial,
}

/// Exchange placement decision for one aggregation build: the hash key
/// and the shuffle position. A pure function of the mode and the group-by
/// columns, with no side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangePlacement {
    pub key: HashKey,
    pub position: ShufflePosition,
}

impl ExchangePlacement {
    pub fn for_mode(mode: ShuffleMode, group_by: &[ColumnRef]) -> Self {
        match mode {
            ShuffleMode::BeforePartial => Self {
                key: HashKey::Columns(group_by.to_vec()),
                position: ShufflePosition::AboveInput,
            },
            ShuffleMode::BeforeMerge => Self {
                key: HashKey::Synthetic,
                position: ShufflePosition::AbovePartial,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "before_partial".parse::<ShuffleMode>().unwrap(),
            ShuffleMode::BeforePartial
        );
        assert_eq!(
            "before_merge".parse::<ShuffleMode>().unwrap(),
            ShuffleMode::BeforeMerge
        );
        assert!(matches!(
            "before_final".parse::<ShuffleMode>(),
            Err(PlannerError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn test_mode_from_settings() {
        let settings = Settings::new();
        assert_eq!(
            ShuffleMode::from_settings(&settings).unwrap(),
            ShuffleMode::BeforePartial
        );

        settings.set(GROUP_BY_SHUFFLE_MODE, "before_merge").unwrap();
        assert_eq!(
            ShuffleMode::from_settings(&settings).unwrap(),
            ShuffleMode::BeforeMerge
        );

        settings.set(GROUP_BY_SHUFFLE_MODE, "sometimes").unwrap();
        assert!(ShuffleMode::from_settings(&settings).is_err());
    }

    #[test]
    fn test_exchange_kind_display() {
        assert_eq!(ExchangeKind::Merge.to_string(), "Merge");
        let key = HashKey::Columns(vec![ColumnRef::new("numbers_mt", "number", 0)]);
        assert_eq!(
            ExchangeKind::Hash(key).to_string(),
            "Hash(numbers_mt.number (#0))"
        );
        assert_eq!(
            ExchangeKind::Hash(HashKey::Synthetic).to_string(),
            "Hash(_group_by_key)"
        );
    }

    #[test]
    fn test_placement_decision_table() {
        let group_by = vec![ColumnRef::new("t", "a", 0), ColumnRef::new("t", "b", 1)];

        let p = ExchangePlacement::for_mode(ShuffleMode::BeforePartial, &group_by);
        assert_eq!(p.position, ShufflePosition::AboveInput);
        assert_eq!(p.key, HashKey::Columns(group_by.clone()));

        let p = ExchangePlacement::for_mode(ShuffleMode::BeforeMerge, &group_by);
        assert_eq!(p.position, ShufflePosition::AbovePartial);
        assert_eq!(p.key, HashKey::Synthetic);
    }

    #[test]
    fn test_mode_serde_string_form() {
        let json = serde_json::to_string(&ShuffleMode::BeforeMerge).unwrap();
        assert_eq!(json, "\"before_merge\"");
    }
}
