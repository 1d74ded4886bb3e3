//! JSONL chat transcript as a visibility sink.
//!
//! Layout: an optional header object on line 1 (no `mes` field), then one
//! message object per line. `is_system` is the hidden flag; every other field
//! is carried through untouched. Lines that are not message objects stay in
//! place as missing entries and are written back verbatim.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use vwk_window::{ChatLog, PresentationError, Presenter, VisibilitySink};

/// One chat message. Only `is_system` is interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub is_system: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug)]
struct Line {
    raw: String,
    message: Option<ChatMessage>,
    touched: bool,
}

/// Logs each batch; stands in for a rendering surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn render(&mut self, indices: &[usize], hidden: bool) -> Result<(), PresentationError> {
        info!(
            count = indices.len(),
            first = indices.first().copied(),
            last = indices.last().copied(),
            hidden,
            "presentation batch"
        );
        Ok(())
    }
}

pub struct ChatFile {
    path: PathBuf,
    header: Option<String>,
    lines: Vec<Line>,
    presenter: Box<dyn Presenter + Send>,
    dirty: bool,
}

impl std::fmt::Debug for ChatFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatFile")
            .field("path", &self.path)
            .field("messages", &self.lines.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl ChatFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read chat file: {}", path.display()))?;
        Ok(Self::parse(path, &raw))
    }

    /// Parse transcript text. Never fails: unparseable lines become missing entries.
    pub fn parse(path: impl Into<PathBuf>, raw: &str) -> Self {
        let mut header = None;
        let mut lines = Vec::new();

        for (n, text) in raw.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let value: Option<Value> = serde_json::from_str(text).ok();
            if n == 0 && is_header(value.as_ref()) {
                header = Some(text.to_string());
                continue;
            }
            let message = value
                .filter(|v| v.get("mes").is_some())
                .and_then(|v| serde_json::from_value::<ChatMessage>(v).ok());
            lines.push(Line {
                raw: text.to_string(),
                message,
                touched: false,
            });
        }

        Self {
            path: path.into(),
            header,
            lines,
            presenter: Box::new(TracingPresenter),
            dirty: false,
        }
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter + Send>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn message(&self, index: usize) -> Option<&ChatMessage> {
        self.lines.get(index).and_then(|l| l.message.as_ref())
    }

    /// Append a message to the tail (host-side growth).
    pub fn push(&mut self, message: ChatMessage) -> Result<()> {
        let raw = serde_json::to_string(&message).context("chat message serialize failed")?;
        self.lines.push(Line {
            raw,
            message: Some(message),
            touched: false,
        });
        self.dirty = true;
        Ok(())
    }

    /// Remove the message at `index` (host-side deletion).
    pub fn remove(&mut self, index: usize) -> Option<ChatMessage> {
        if index >= self.lines.len() {
            return None;
        }
        self.dirty = true;
        self.lines.remove(index).message
    }

    /// Render the transcript. Untouched lines are emitted verbatim.
    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        if let Some(h) = &self.header {
            out.push_str(h);
            out.push('\n');
        }
        for line in &self.lines {
            match (&line.message, line.touched) {
                (Some(m), true) => {
                    let s = serde_json::to_string(m).context("chat message serialize failed")?;
                    out.push_str(&s);
                }
                _ => out.push_str(&line.raw),
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the transcript if anything changed. Atomic: temp file + rename.
    ///
    /// Returns `true` when the file was written.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let body = self.to_jsonl()?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(body.as_bytes())
            .context("failed to write chat temp file")?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace chat file: {}", self.path.display()))?;

        self.dirty = false;
        debug!(path = %self.path.display(), "chat file saved");
        Ok(true)
    }
}

fn is_header(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(map)) if !map.contains_key("mes"))
}

impl ChatLog for ChatFile {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn hidden_at(&self, index: usize) -> Option<bool> {
        self.message(index).map(|m| m.is_system)
    }
}

impl VisibilitySink for ChatFile {
    fn set_hidden(&mut self, index: usize, hidden: bool) {
        if let Some(line) = self.lines.get_mut(index) {
            if let Some(m) = line.message.as_mut() {
                if m.is_system != hidden {
                    m.is_system = hidden;
                    line.touched = true;
                }
            }
        }
    }

    fn present(&mut self, indices: &[usize], hidden: bool) -> Result<(), PresentationError> {
        self.presenter.render(indices, hidden)
    }

    fn persist(&mut self) {
        self.dirty = true;
    }
}
