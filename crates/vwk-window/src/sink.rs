//! Visibility sink contract.
//!
//! The log is owned by the host. This crate reads entry state through
//! [`ChatLog`] and commits transitions through [`VisibilitySink`]:
//!
//! 1. in-memory flags are flipped (infallible),
//! 2. each batch is mirrored to the presentation layer (may fail),
//! 3. persistence is requested when anything changed (fire and forget).
//!
//! A presentation failure is reported and swallowed. Data-model consistency
//! wins over presentation consistency; a later full pass or a refresh of the
//! presentation layer repairs the view.

use tracing::{error, info};

use crate::ReconcileOutcome;

/// Read access to the ordered log.
pub trait ChatLog {
    fn len(&self) -> usize;

    /// Visibility of the entry at `index`.
    ///
    /// `None` for a missing entry, which reconciliation never touches.
    fn hidden_at(&self, index: usize) -> Option<bool>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` as soon as one entry is hidden.
    fn any_hidden(&self) -> bool {
        (0..self.len()).any(|i| self.hidden_at(i) == Some(true))
    }
}

/// Presentation layer failure (unavailable surface, malformed selector, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationError {
    pub message: String,
}

impl PresentationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PresentationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "presentation update failed: {}", self.message)
    }
}

impl std::error::Error for PresentationError {}

/// Mirrors visibility batches onto whatever renders the log.
pub trait Presenter {
    fn render(&mut self, indices: &[usize], hidden: bool) -> Result<(), PresentationError>;
}

/// Write access to the log plus its presentation and persistence hooks.
pub trait VisibilitySink: ChatLog {
    /// Flip the in-memory flag. Missing entries are left alone.
    fn set_hidden(&mut self, index: usize, hidden: bool);

    /// Mirror one batch to the presentation layer.
    fn present(&mut self, indices: &[usize], hidden: bool) -> Result<(), PresentationError>;

    /// Request that the mutated log be persisted. Must not block.
    fn persist(&mut self);
}

/// Commit an outcome through the sink.
///
/// Returns `true` when at least one transition was applied.
pub fn apply_outcome<S: VisibilitySink + ?Sized>(sink: &mut S, outcome: &ReconcileOutcome) -> bool {
    if outcome.is_noop() {
        return false;
    }

    for &i in &outcome.to_hide {
        sink.set_hidden(i, true);
    }
    for &i in &outcome.to_show {
        sink.set_hidden(i, false);
    }

    for (indices, hidden) in [(&outcome.to_hide, true), (&outcome.to_show, false)] {
        if indices.is_empty() {
            continue;
        }
        if let Err(err) = sink.present(indices, hidden) {
            error!(%err, count = indices.len(), hidden, "presentation batch dropped");
        }
    }

    info!(
        hidden = outcome.to_hide.len(),
        shown = outcome.to_show.len(),
        "visibility transitions applied"
    );
    sink.persist();
    true
}
