use serde::{Deserialize, Serialize};

/// Look-ahead bound used by the full reconciler when skipping settled runs.
pub const DEFAULT_SKIP_DISTANCE: usize = 10;

/// Conversation identity (stable string: character id, group id, ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-conversation window configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of most recent messages that stay visible. 0 hides nothing.
    pub window_size: usize,

    /// Log length at which visibility was last reconciled.
    pub checkpoint_len: usize,
}

impl WindowConfig {
    pub fn new(window_size: usize, checkpoint_len: usize) -> Self {
        Self {
            window_size,
            checkpoint_len,
        }
    }

    /// First visible index for a log of `len` entries.
    ///
    /// `0` when the window is disabled or covers the whole log.
    pub fn visible_start(&self, len: usize) -> usize {
        if self.window_size > 0 && self.window_size < len {
            len - self.window_size
        } else {
            0
        }
    }
}

/// Clamp a user-entered window size. Negative input means "hide nothing".
pub fn clamp_window_size(raw: i64) -> usize {
    usize::try_from(raw).unwrap_or(0)
}

/// Result of one reconciliation pass.
///
/// `to_hide` and `to_show` are ascending and index-disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub to_hide: Vec<usize>,
    pub to_show: Vec<usize>,
    /// Length written to the store as the new checkpoint.
    pub checkpoint_len: usize,
}

impl ReconcileOutcome {
    pub fn unchanged(checkpoint_len: usize) -> Self {
        Self {
            to_hide: Vec::new(),
            to_show: Vec::new(),
            checkpoint_len,
        }
    }

    /// `true` when the pass produced no transitions.
    pub fn is_noop(&self) -> bool {
        self.to_hide.is_empty() && self.to_show.is_empty()
    }

    pub fn transitions(&self) -> usize {
        self.to_hide.len() + self.to_show.len()
    }
}
