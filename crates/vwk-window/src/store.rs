use std::collections::BTreeMap;

use crate::{ConversationId, WindowConfig};

/// Per-conversation window configuration record.
///
/// Implementations are thin accessors over an externally owned record:
/// `get` never fails (absent conversations read as defaults) and `set` is an
/// idempotent overwrite. Durability is the implementation's concern.
pub trait WindowConfigStore {
    fn get(&self, conversation: &ConversationId) -> WindowConfig;

    fn set(&mut self, conversation: &ConversationId, window_size: usize, checkpoint_len: usize);

    /// Overwrite only the checkpoint, keeping the stored window size.
    fn set_checkpoint(&mut self, conversation: &ConversationId, checkpoint_len: usize) {
        let window_size = self.get(conversation).window_size;
        self.set(conversation, window_size, checkpoint_len);
    }
}

/// In-memory store, keyed deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryConfigStore {
    records: BTreeMap<ConversationId, WindowConfig>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with a stored record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, conversation: &ConversationId) -> bool {
        self.records.contains_key(conversation)
    }
}

impl WindowConfigStore for MemoryConfigStore {
    fn get(&self, conversation: &ConversationId) -> WindowConfig {
        self.records.get(conversation).copied().unwrap_or_default()
    }

    fn set(&mut self, conversation: &ConversationId, window_size: usize, checkpoint_len: usize) {
        self.records.insert(
            conversation.clone(),
            WindowConfig::new(window_size, checkpoint_len),
        );
    }
}
