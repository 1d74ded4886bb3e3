use std::ops::Range;

use tracing::{debug, warn};

use crate::sink::{apply_outcome, ChatLog, VisibilitySink};
use crate::{ConversationId, ReconcileOutcome, WindowConfigStore};

/// Error returned when a full pass cannot run at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// The host has no log loaded for the conversation. Nothing was mutated
    /// and the checkpoint was left as is.
    LogUnavailable { conversation: ConversationId },
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::LogUnavailable { conversation } => write!(
                f,
                "full reconcile aborted: no log available for conversation {conversation}"
            ),
        }
    }
}

impl std::error::Error for ReconcileError {}

/// Full reconciliation against the configured window.
///
/// Safe after any structural change: shrink, replacement, first run or a new
/// window size. `[0, visible_start)` ends hidden and `[visible_start, len)`
/// ends visible. Runs already in the right state are skipped up to
/// `skip_distance` entries at a time; `0` or `1` scans linearly.
///
/// The checkpoint is advanced to the observed length even when nothing
/// changed. Running twice with no log change yields an empty second outcome.
pub fn reconcile_full<C, S>(
    store: &mut C,
    conversation: &ConversationId,
    log: Option<&mut S>,
    skip_distance: usize,
) -> Result<ReconcileOutcome, ReconcileError>
where
    C: WindowConfigStore + ?Sized,
    S: VisibilitySink + ?Sized,
{
    let Some(log) = log else {
        warn!(%conversation, "full reconcile aborted: log not available");
        return Err(ReconcileError::LogUnavailable {
            conversation: conversation.clone(),
        });
    };

    let cfg = store.get(conversation);
    let n = cfg.window_size;
    let len = log.len();

    if (n == 0 || n >= len) && !log.any_hidden() {
        store.set(conversation, n, len);
        debug!(%conversation, window = n, len, "full pass: everything already visible");
        return Ok(ReconcileOutcome::unchanged(len));
    }

    let visible_start = cfg.visible_start(len);
    let outcome = ReconcileOutcome {
        to_hide: collect_mismatches(&*log, 0..visible_start, true, skip_distance),
        to_show: collect_mismatches(&*log, visible_start..len, false, skip_distance),
        checkpoint_len: len,
    };

    apply_outcome(log, &outcome);
    store.set(conversation, n, len);
    debug!(
        %conversation,
        window = n,
        len,
        hidden = outcome.to_hide.len(),
        shown = outcome.to_show.len(),
        "full pass complete"
    );
    Ok(outcome)
}

/// Indices in `range` whose state differs from `want_hidden`, ascending.
///
/// On an entry already in the wanted state, looks ahead up to `skip` entries
/// and jumps past the confirmed run. Missing entries are skipped and end a run.
fn collect_mismatches<L: ChatLog + ?Sized>(
    log: &L,
    range: Range<usize>,
    want_hidden: bool,
    skip: usize,
) -> Vec<usize> {
    let mut out = Vec::new();
    let end = range.end;
    let mut i = range.start;

    while i < end {
        match log.hidden_at(i) {
            None => i += 1,
            Some(hidden) if hidden != want_hidden => {
                out.push(i);
                i += 1;
            }
            Some(_) => {
                let bound = end.min(i.saturating_add(skip.max(1)));
                let mut next = i + 1;
                while next < bound && log.hidden_at(next) == Some(want_hidden) {
                    next += 1;
                }
                i = next;
            }
        }
    }
    out
}
