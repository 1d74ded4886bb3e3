#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use vwk_host::Host;
use vwk_window::{ConversationId, MemoryLog};

/// In-memory host. Messages queued through `inbox` land on the active log the
/// next time the session reads it, the way a host appends between passes.
#[derive(Debug, Default)]
pub struct MemoryHost {
    pub chats: BTreeMap<ConversationId, MemoryLog>,
    pub active: Option<ConversationId>,
    pub inbox: Arc<Mutex<usize>>,
    pub flushes: usize,
}

impl MemoryHost {
    pub fn with_chat(mut self, id: &str, log: MemoryLog) -> Self {
        self.chats.insert(ConversationId::new(id), log);
        self
    }

    pub fn chat(&self, id: &str) -> &MemoryLog {
        &self.chats[&ConversationId::new(id)]
    }

    pub fn chat_mut(&mut self, id: &str) -> &mut MemoryLog {
        self.chats
            .get_mut(&ConversationId::new(id))
            .expect("chat registered")
    }
}

impl Host for MemoryHost {
    type Log = MemoryLog;

    fn conversation(&self) -> Option<ConversationId> {
        self.active.clone()
    }

    fn switch_to(&mut self, conversation: &ConversationId) {
        self.active = Some(conversation.clone());
    }

    fn log_mut(&mut self) -> Option<&mut MemoryLog> {
        let id = self.active.as_ref()?;
        let log = self.chats.get_mut(id)?;
        let mut inbox = self.inbox.lock().expect("inbox lock");
        log.append_visible(std::mem::take(&mut *inbox));
        Some(log)
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

pub fn conv(id: &str) -> ConversationId {
    ConversationId::new(id)
}
