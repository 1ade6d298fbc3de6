//! Session-scoped settings.
//!
//! Each client session owns one `Settings` instance. Values are set at
//! session start or via a `SET` statement and read by the planner at the
//! top of a plan build — never mid-build, so one build sees exactly one
//! value for each setting.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::{OspreyResult, SettingsError};

/// Setting key: where the hash shuffle sits relative to the two
/// aggregation stages of a distributed `GROUP BY`.
pub const GROUP_BY_SHUFFLE_MODE: &str = "group_by_shuffle_mode";

/// Registry of recognized settings: (key, default value).
const KNOWN_SETTINGS: &[(&str, &str)] = &[(GROUP_BY_SHUFFLE_MODE, "before_partial")];

/// Session-scoped key/value settings store.
///
/// Only keys listed in the registry are accepted; values are free-form
/// strings here and validated by the typed accessor of whoever consumes
/// them (an unrecognized shuffle-mode value is a planner configuration
/// error, not a settings error).
#[derive(Debug, Default)]
pub struct Settings {
    values: RwLock<BTreeMap<String, String>>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a session setting, as a `SET key = value` statement would.
    pub fn set(&self, key: &str, value: &str) -> OspreyResult<()> {
        if !KNOWN_SETTINGS.iter().any(|(k, _)| *k == key) {
            return Err(SettingsError::UnknownSetting(key.to_string()).into());
        }
        tracing::debug!(key, value, "session setting changed");
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Current value of a setting: the session override if set, otherwise
    /// the registry default. `None` for unrecognized keys.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.values.read().get(key) {
            return Some(v.clone());
        }
        KNOWN_SETTINGS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| d.to_string())
    }

    /// Serde-able view of the session overrides, for session handoff.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }

    /// Rebuild a settings store from a snapshot. Unknown keys are dropped.
    pub fn from_snapshot(snapshot: BTreeMap<String, String>) -> Self {
        let settings = Self::new();
        {
            let mut values = settings.values.write();
            for (k, v) in snapshot {
                if KNOWN_SETTINGS.iter().any(|(known, _)| *known == k) {
                    values.insert(k, v);
                }
            }
        }
        settings
    }
}
