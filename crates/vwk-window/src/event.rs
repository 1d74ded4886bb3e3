use serde::{Deserialize, Serialize};

use crate::ConversationId;

/// Which reconciler a notification calls for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Incremental,
    Full,
}

/// Log-lifecycle notifications delivered by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The host switched to another conversation (or loaded the first one).
    ConversationSwitched { conversation: ConversationId },
    /// One or more messages were appended to the tail.
    MessageAppended,
    /// A message was deleted somewhere in the log.
    MessageRemoved,
    /// The log was reloaded or replaced wholesale.
    ChatReloaded,
    /// The user entered a new window size. Negative values mean 0.
    WindowReconfigured { window_size: i64 },
}

impl HostEvent {
    /// Growth takes the incremental path; everything else is structural.
    pub fn pass(&self) -> PassKind {
        match self {
            HostEvent::MessageAppended => PassKind::Incremental,
            HostEvent::ConversationSwitched { .. }
            | HostEvent::MessageRemoved
            | HostEvent::ChatReloaded
            | HostEvent::WindowReconfigured { .. } => PassKind::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_growth_is_incremental() {
        assert_eq!(HostEvent::MessageAppended.pass(), PassKind::Incremental);
        for ev in [
            HostEvent::ConversationSwitched {
                conversation: ConversationId::new("c"),
            },
            HostEvent::MessageRemoved,
            HostEvent::ChatReloaded,
            HostEvent::WindowReconfigured { window_size: 3 },
        ] {
            assert_eq!(ev.pass(), PassKind::Full, "{ev:?}");
        }
    }
}
