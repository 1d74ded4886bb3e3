use tracing::debug;

use crate::sink::{apply_outcome, VisibilitySink};
use crate::{ConversationId, ReconcileOutcome, WindowConfigStore};

/// What the incremental path did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncrementalOutcome {
    /// Window slid forward with growth. The checkpoint is now `outcome.checkpoint_len`.
    Advanced(ReconcileOutcome),

    /// Window disabled or log empty. No transitions; the checkpoint was
    /// advanced only if the log grew.
    Inactive { checkpoint_len: usize },

    /// Log did not grow since the checkpoint (deletion, reset, replacement).
    ///
    /// Nothing was mutated. The caller must run a full pass on the next
    /// structural event; this path never invokes it.
    Deferred {
        checkpoint_len: usize,
        current_len: usize,
    },
}

impl IncrementalOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, IncrementalOutcome::Deferred { .. })
    }

    /// Indices hidden by this pass.
    pub fn hidden(&self) -> &[usize] {
        match self {
            IncrementalOutcome::Advanced(o) => &o.to_hide,
            _ => &[],
        }
    }
}

/// Incremental reconciliation after append-only growth.
///
/// Only `[max(0, P - N), L - N)` is inspected, where `P` is the stored
/// checkpoint, `L` the current length and `N` the window size. Indices below
/// that range are assumed settled by the previous pass. Growth only hides;
/// `to_show` is always empty. An absent log reads as length 0.
pub fn reconcile_incremental<C, S>(
    store: &mut C,
    conversation: &ConversationId,
    log: Option<&mut S>,
) -> IncrementalOutcome
where
    C: WindowConfigStore + ?Sized,
    S: VisibilitySink + ?Sized,
{
    let cfg = store.get(conversation);
    let n = cfg.window_size;
    let prev_len = cfg.checkpoint_len;
    let len = log.as_deref().map_or(0, |l| l.len());

    if n == 0 || len == 0 {
        let mut checkpoint_len = prev_len;
        if len > prev_len {
            store.set(conversation, n, len);
            checkpoint_len = len;
        }
        debug!(%conversation, window = n, len, "incremental pass inactive");
        return IncrementalOutcome::Inactive { checkpoint_len };
    }

    if len <= prev_len {
        debug!(
            %conversation,
            checkpoint = prev_len,
            len,
            "log did not grow; deferring to full pass"
        );
        return IncrementalOutcome::Deferred {
            checkpoint_len: prev_len,
            current_len: len,
        };
    }

    // len > 0 here, so an absent log was handled above.
    let Some(log) = log else {
        return IncrementalOutcome::Inactive {
            checkpoint_len: prev_len,
        };
    };

    let target_start = len.saturating_sub(n);
    let previous_start = prev_len.saturating_sub(n);

    let mut outcome = ReconcileOutcome::unchanged(len);
    if target_start > previous_start {
        outcome.to_hide = (previous_start..target_start.min(len))
            .filter(|&i| log.hidden_at(i) == Some(false))
            .collect();
    }

    apply_outcome(log, &outcome);
    store.set(conversation, n, len);
    debug!(
        %conversation,
        from = previous_start,
        to = target_start,
        hidden = outcome.to_hide.len(),
        "incremental pass complete"
    );
    IncrementalOutcome::Advanced(outcome)
}
