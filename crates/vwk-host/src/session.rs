//! Binding between host notifications and the two reconcilers.
//!
//! A [`Session`] holds the reconciler inputs for whatever conversation the
//! host has active and maps each [`HostEvent`] to one pass. It guarantees the
//! caller obligation of the incremental path: a structural event always runs
//! a full pass, so a deferred incremental pass is repaired on the next
//! deletion, reload, switch or reconfiguration.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vwk_window::{
    clamp_window_size, reconcile_full, reconcile_incremental, ConversationId, HostEvent,
    IncrementalOutcome, PassKind, ReconcileError, VisibilitySink, WindowConfigStore,
};

/// The host application as seen by a session.
pub trait Host {
    type Log: VisibilitySink;

    /// Conversation currently shown, if any.
    fn conversation(&self) -> Option<ConversationId>;

    /// Make `conversation` the active one (load its log).
    fn switch_to(&mut self, conversation: &ConversationId);

    /// The active conversation's log. `None` when not loaded.
    fn log_mut(&mut self) -> Option<&mut Self::Log>;

    /// Re-read the active log from its source.
    fn reload(&mut self) {}

    /// Write out whatever the sink marked for persistence. Called after each
    /// handled event; failures are the host's to report.
    fn flush(&mut self) {}
}

/// Summary of one pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PassReport {
    Applied {
        conversation: ConversationId,
        kind: PassKind,
        hidden: Vec<usize>,
        shown: Vec<usize>,
        checkpoint_len: usize,
    },
    /// Incremental pass saw no growth; a full pass must follow.
    Deferred {
        conversation: ConversationId,
        checkpoint_len: usize,
        current_len: usize,
    },
    /// Incremental pass with the window disabled or an empty log.
    Inactive {
        conversation: ConversationId,
        checkpoint_len: usize,
    },
    /// Full pass aborted: no log loaded.
    Aborted { conversation: ConversationId },
    /// No active conversation; the event was dropped.
    Idle,
}

impl PassReport {
    pub fn transitions(&self) -> usize {
        match self {
            PassReport::Applied { hidden, shown, .. } => hidden.len() + shown.len(),
            _ => 0,
        }
    }
}

pub struct Session<H, S> {
    host: H,
    store: S,
    skip_distance: usize,
}

impl<H: Host, S: WindowConfigStore> Session<H, S> {
    pub fn new(host: H, store: S, skip_distance: usize) -> Self {
        Self {
            host,
            store,
            skip_distance,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one host notification: side effects, then the pass it calls for.
    pub fn handle(&mut self, event: HostEvent) -> PassReport {
        if !self.prepare(&event) {
            return PassReport::Idle;
        }
        self.settle(event.pass())
    }

    /// Apply the side effects of `event` without running a pass.
    ///
    /// Returns `false` when the event has nothing to act on.
    pub fn prepare(&mut self, event: &HostEvent) -> bool {
        match event {
            HostEvent::ConversationSwitched { conversation } => {
                self.host.switch_to(conversation);
                true
            }
            HostEvent::WindowReconfigured { window_size } => {
                let Some(conversation) = self.host.conversation() else {
                    debug!("reconfiguration without active conversation dropped");
                    return false;
                };
                let n = clamp_window_size(*window_size);
                let checkpoint = self.store.get(&conversation).checkpoint_len;
                self.store.set(&conversation, n, checkpoint);
                info!(%conversation, window = n, "window reconfigured");
                true
            }
            HostEvent::ChatReloaded => {
                self.host.reload();
                true
            }
            HostEvent::MessageAppended | HostEvent::MessageRemoved => true,
        }
    }

    /// Run one pass and let the host write out what it persisted.
    pub fn settle(&mut self, kind: PassKind) -> PassReport {
        let report = self.run(kind);
        self.host.flush();
        report
    }

    /// Run one pass for the active conversation.
    pub fn run(&mut self, kind: PassKind) -> PassReport {
        let Some(conversation) = self.host.conversation() else {
            debug!(?kind, "no active conversation; pass skipped");
            return PassReport::Idle;
        };

        match kind {
            PassKind::Incremental => {
                match reconcile_incremental(&mut self.store, &conversation, self.host.log_mut()) {
                    IncrementalOutcome::Advanced(o) => PassReport::Applied {
                        conversation,
                        kind,
                        hidden: o.to_hide,
                        shown: o.to_show,
                        checkpoint_len: o.checkpoint_len,
                    },
                    IncrementalOutcome::Inactive { checkpoint_len } => PassReport::Inactive {
                        conversation,
                        checkpoint_len,
                    },
                    IncrementalOutcome::Deferred {
                        checkpoint_len,
                        current_len,
                    } => PassReport::Deferred {
                        conversation,
                        checkpoint_len,
                        current_len,
                    },
                }
            }
            PassKind::Full => match reconcile_full(
                &mut self.store,
                &conversation,
                self.host.log_mut(),
                self.skip_distance,
            ) {
                Ok(o) => PassReport::Applied {
                    conversation,
                    kind,
                    hidden: o.to_hide,
                    shown: o.to_show,
                    checkpoint_len: o.checkpoint_len,
                },
                Err(ReconcileError::LogUnavailable { conversation }) => {
                    PassReport::Aborted { conversation }
                }
            },
        }
    }
}
