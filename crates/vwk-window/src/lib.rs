//! vwk-window
//!
//! Visibility window reconciliation over an ordered chat log.
//!
//! Architectural decisions:
//! - Everything before the last N messages is hidden, the last N are visible
//! - Append-only growth takes the incremental path (cost = newly hidden range)
//! - Any other structural change takes the full path (skip-scan over settled runs)
//! - Both paths end by writing the observed log length as the checkpoint
//! - Presentation failures never block the data mutation or the checkpoint
//!
//! Deterministic, pure logic. The log, the presentation layer and the
//! preference record are injected through traits.

mod event;
mod full;
mod incremental;
mod memory;
mod sink;
mod store;
mod types;

pub use event::{HostEvent, PassKind};
pub use full::{reconcile_full, ReconcileError};
pub use incremental::{reconcile_incremental, IncrementalOutcome};
pub use memory::{MemoryLog, NullPresenter};
pub use sink::{apply_outcome, ChatLog, PresentationError, Presenter, VisibilitySink};
pub use store::{MemoryConfigStore, WindowConfigStore};
pub use types::*;
