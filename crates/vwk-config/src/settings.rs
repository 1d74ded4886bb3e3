use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Typed view over the merged configuration.
///
/// Every field is optional in YAML:
/// - reconcile.skip_distance (default 10)
/// - dispatch.full_debounce_ms (default 200)
/// - dispatch.incremental_debounce_ms (default 50)
/// - store.preferences_path (default "preferences.json")
/// - log.filter (default "info")
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub skip_distance: usize,
    pub full_debounce_ms: u64,
    pub incremental_debounce_ms: u64,
    pub preferences_path: PathBuf,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip_distance: 10,
            full_debounce_ms: 200,
            incremental_debounce_ms: 50,
            preferences_path: PathBuf::from("preferences.json"),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Build from canonical config JSON (produced by `load_layered_yaml*`).
    ///
    /// Wrong types are errors; absent keys take defaults.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let d = Settings::default();
        Ok(Self {
            skip_distance: read_u64(cfg, "/reconcile/skip_distance")?
                .map(usize::try_from)
                .transpose()
                .map_err(|_| anyhow!("reconcile.skip_distance out of range"))?
                .unwrap_or(d.skip_distance),
            full_debounce_ms: read_u64(cfg, "/dispatch/full_debounce_ms")?
                .unwrap_or(d.full_debounce_ms),
            incremental_debounce_ms: read_u64(cfg, "/dispatch/incremental_debounce_ms")?
                .unwrap_or(d.incremental_debounce_ms),
            preferences_path: read_str(cfg, "/store/preferences_path")?
                .map(PathBuf::from)
                .unwrap_or(d.preferences_path),
            log_filter: read_str(cfg, "/log/filter")?
                .map(str::to_string)
                .unwrap_or(d.log_filter),
        })
    }

    pub fn full_debounce(&self) -> Duration {
        Duration::from_millis(self.full_debounce_ms)
    }

    pub fn incremental_debounce(&self) -> Duration {
        Duration::from_millis(self.incremental_debounce_ms)
    }
}

fn read_u64(cfg: &Value, ptr: &str) -> Result<Option<u64>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| anyhow!("config {ptr} must be a non-negative integer (got {v})")),
    }
}

fn read_str<'a>(cfg: &'a Value, ptr: &str) -> Result<Option<&'a str>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| anyhow!("config {ptr} must be a string (got {v})")),
    }
}
