//! Debounced event dispatch.
//!
//! One tokio task owns the [`Session`]. Events arrive on an unbounded channel;
//! side effects (switch, reconfigure) apply on receipt, passes are delayed by
//! a quiet period so a burst of notifications collapses into one pass. A
//! pending full pass absorbs pending incremental work. A conversation switch
//! first settles whatever is pending for the conversation being left. Each
//! pass runs to completion before the next event is read.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use vwk_window::{HostEvent, PassKind, WindowConfigStore};

use crate::session::{Host, PassReport, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchTiming {
    pub full_debounce: Duration,
    pub incremental_debounce: Duration,
}

impl Default for DispatchTiming {
    fn default() -> Self {
        Self {
            full_debounce: Duration::from_millis(200),
            incremental_debounce: Duration::from_millis(50),
        }
    }
}

impl DispatchTiming {
    fn delay(&self, kind: PassKind) -> Duration {
        match kind {
            PassKind::Full => self.full_debounce,
            PassKind::Incremental => self.incremental_debounce,
        }
    }
}

/// Sending side of a running dispatcher. Cloneable.
#[derive(Clone, Debug)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<HostEvent>,
    reports: broadcast::Sender<PassReport>,
}

impl DispatchHandle {
    pub fn send(&self, event: HostEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|e| anyhow!("dispatcher stopped; dropped {:?}", e.0))
    }

    /// Receive a report for every pass run from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PassReport> {
        self.reports.subscribe()
    }
}

/// Spawn the dispatcher task.
///
/// The task ends once every handle is dropped, after running any pending
/// pass, and hands the session back.
pub fn spawn<H, S>(
    session: Session<H, S>,
    timing: DispatchTiming,
) -> (DispatchHandle, JoinHandle<Session<H, S>>)
where
    H: Host + Send + 'static,
    S: WindowConfigStore + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let (reports, _rx) = broadcast::channel(256);
    let handle = DispatchHandle {
        tx,
        reports: reports.clone(),
    };
    let task = tokio::spawn(run_loop(session, rx, reports, timing));
    (handle, task)
}

/// Fold a new pass request into the pending one.
///
/// Both requests must target the same conversation; the loop settles
/// pending work before a switch.
fn schedule(
    pending: Option<(PassKind, Instant)>,
    kind: PassKind,
    timing: &DispatchTiming,
    now: Instant,
) -> (PassKind, Instant) {
    match (pending, kind) {
        // Growth does not postpone a pending structural pass.
        (Some((PassKind::Full, at)), PassKind::Incremental) => (PassKind::Full, at),
        (_, kind) => (kind, now + timing.delay(kind)),
    }
}

async fn run_loop<H, S>(
    mut session: Session<H, S>,
    mut rx: mpsc::UnboundedReceiver<HostEvent>,
    reports: broadcast::Sender<PassReport>,
    timing: DispatchTiming,
) -> Session<H, S>
where
    H: Host,
    S: WindowConfigStore,
{
    let mut pending: Option<(PassKind, Instant)> = None;

    loop {
        let received = match pending {
            Some((_, at)) => tokio::select! {
                ev = rx.recv() => Some(ev),
                _ = tokio::time::sleep_until(at) => None,
            },
            None => Some(rx.recv().await),
        };

        match received {
            Some(Some(event)) => {
                if matches!(event, HostEvent::ConversationSwitched { .. }) {
                    if let Some((kind, _)) = pending.take() {
                        settle(&mut session, &reports, kind);
                    }
                }
                if session.prepare(&event) {
                    pending = Some(schedule(pending, event.pass(), &timing, Instant::now()));
                }
            }
            Some(None) => {
                if let Some((kind, _)) = pending.take() {
                    settle(&mut session, &reports, kind);
                }
                debug!("dispatcher channel closed");
                return session;
            }
            None => {
                if let Some((kind, _)) = pending.take() {
                    settle(&mut session, &reports, kind);
                }
            }
        }
    }
}

fn settle<H: Host, S: WindowConfigStore>(
    session: &mut Session<H, S>,
    reports: &broadcast::Sender<PassReport>,
    kind: PassKind,
) {
    let report = session.settle(kind);
    debug!(?kind, transitions = report.transitions(), "debounced pass settled");
    let _ = reports.send(report);
}
