//! Per-conversation preference record on disk.
//!
//! One JSON document maps conversation id to its window configuration. The
//! file is read once on open and rewritten on every `set`. Write failures are
//! logged and swallowed: the store contract is "never fails", and the next
//! successful write carries the latest state anyway.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use vwk_window::{ConversationId, WindowConfig, WindowConfigStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub window_size: usize,
    pub checkpoint_len: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PreferenceFile {
    path: PathBuf,
    records: BTreeMap<ConversationId, PreferenceRecord>,
}

impl PreferenceFile {
    /// Open the record file. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("invalid preference file: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read preference file: {}", path.display()))
            }
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, conversation: &ConversationId) -> Option<&PreferenceRecord> {
        self.records.get(conversation)
    }

    fn write(&self) -> Result<()> {
        let body =
            serde_json::to_string_pretty(&self.records).context("preference serialize failed")?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(body.as_bytes())
            .context("failed to write preference temp file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl WindowConfigStore for PreferenceFile {
    fn get(&self, conversation: &ConversationId) -> WindowConfig {
        self.records
            .get(conversation)
            .map(|r| WindowConfig::new(r.window_size, r.checkpoint_len))
            .unwrap_or_default()
    }

    fn set(&mut self, conversation: &ConversationId, window_size: usize, checkpoint_len: usize) {
        self.records.insert(
            conversation.clone(),
            PreferenceRecord {
                window_size,
                checkpoint_len,
                updated_at: Utc::now(),
            },
        );
        if let Err(err) = self.write() {
            warn!(%conversation, path = %self.path.display(), "preference write failed: {err:#}");
        }
    }
}
