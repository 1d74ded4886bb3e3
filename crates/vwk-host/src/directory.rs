use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, warn};
use vwk_window::ConversationId;

use crate::chat_file::ChatFile;
use crate::session::Host;

/// Host over a directory of transcripts: conversation `id` lives in `<dir>/<id>.jsonl`.
#[derive(Debug)]
pub struct ChatDirectory {
    dir: PathBuf,
    active: Option<(ConversationId, Option<ChatFile>)>,
}

impl ChatDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            active: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Transcript path for `conversation`. Ids that would leave `dir` are rejected.
    pub fn chat_path(&self, conversation: &ConversationId) -> Result<PathBuf> {
        let id = conversation.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
            bail!("invalid conversation id for a chat file name: {id:?}");
        }
        Ok(self.dir.join(format!("{id}.jsonl")))
    }

    /// Active transcript, if loaded.
    pub fn chat(&self) -> Option<&ChatFile> {
        self.active.as_ref().and_then(|(_, chat)| chat.as_ref())
    }

    fn load(&self, conversation: &ConversationId) -> Option<ChatFile> {
        match self.chat_path(conversation).and_then(ChatFile::open) {
            Ok(chat) => Some(chat),
            Err(err) => {
                warn!(%conversation, "chat not loaded: {err:#}");
                None
            }
        }
    }
}

impl Host for ChatDirectory {
    type Log = ChatFile;

    fn conversation(&self) -> Option<ConversationId> {
        self.active.as_ref().map(|(id, _)| id.clone())
    }

    fn switch_to(&mut self, conversation: &ConversationId) {
        self.flush();
        let chat = self.load(conversation);
        debug!(%conversation, loaded = chat.is_some(), "switched conversation");
        self.active = Some((conversation.clone(), chat));
    }

    fn log_mut(&mut self) -> Option<&mut ChatFile> {
        self.active.as_mut().and_then(|(_, chat)| chat.as_mut())
    }

    /// Drops unsaved changes.
    fn reload(&mut self) {
        if let Some(conversation) = self.conversation() {
            let chat = self.load(&conversation);
            self.active = Some((conversation, chat));
        }
    }

    fn flush(&mut self) {
        if let Some(chat) = self.log_mut() {
            if let Err(err) = chat.save() {
                warn!(path = %chat.path().display(), "chat save failed: {err:#}");
            }
        }
    }
}
