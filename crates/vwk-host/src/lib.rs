//! vwk-host
//!
//! Binds the window reconcilers to a host: transcripts on disk, a
//! per-conversation preference record, and a debounced event loop.

pub mod chat_file;
pub mod directory;
pub mod dispatch;
pub mod prefs;
pub mod session;

pub use chat_file::{ChatFile, ChatMessage, TracingPresenter};
pub use directory::ChatDirectory;
pub use dispatch::{spawn, DispatchHandle, DispatchTiming};
pub use prefs::{PreferenceFile, PreferenceRecord};
pub use session::{Host, PassReport, Session};
