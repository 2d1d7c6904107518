use serde::{Deserialize, Serialize};

use super::id::{ConversationId, MessageId};
use super::message::Message;

/// What the session is doing right now.
///
/// Recording and sending are mutually exclusive; a request can only start
/// from `Idle`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Recording,
    Sending,
}

/// Every mutation of [`SessionState`] is one of these.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Optimistic user message, appended before the request leaves.
    UserMessage(Message),
    RequestStarted,
    RequestSucceeded {
        conversation_id: ConversationId,
        reply: Message,
    },
    RequestFailed {
        error: String,
        notice: Option<Message>,
    },
    /// The in-flight future went away without reporting back.
    RequestAbandoned,
    RecordingStarted,
    RecordingStopped,
    CaptureFailed(String),
    ErrorCleared,
    MessageSelected(MessageId),
    SelectionCleared,
}

/// Conversation log plus the bookkeeping around it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    messages: Vec<Message>,
    conversation_id: Option<ConversationId>,
    status: SessionStatus,
    last_error: Option<String>,
    selected: Option<MessageId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UserMessage(message) => self.messages.push(message),
            SessionEvent::RequestStarted => self.status = SessionStatus::Sending,
            SessionEvent::RequestSucceeded {
                conversation_id,
                reply,
            } => {
                self.conversation_id = Some(conversation_id);
                self.messages.push(reply);
                self.last_error = None;
                self.status = SessionStatus::Idle;
            }
            SessionEvent::RequestFailed { error, notice } => {
                self.last_error = Some(error);
                if let Some(notice) = notice {
                    self.messages.push(notice);
                }
                self.status = SessionStatus::Idle;
            }
            SessionEvent::RequestAbandoned => {
                if self.status == SessionStatus::Sending {
                    self.status = SessionStatus::Idle;
                }
            }
            SessionEvent::RecordingStarted => self.status = SessionStatus::Recording,
            SessionEvent::RecordingStopped => {
                if self.status == SessionStatus::Recording {
                    self.status = SessionStatus::Idle;
                }
            }
            SessionEvent::CaptureFailed(error) => {
                self.last_error = Some(error);
                if self.status == SessionStatus::Recording {
                    self.status = SessionStatus::Idle;
                }
            }
            SessionEvent::ErrorCleared => self.last_error = None,
            SessionEvent::MessageSelected(id) => self.selected = Some(id),
            SessionEvent::SelectionCleared => self.selected = None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_sending(&self) -> bool {
        self.status == SessionStatus::Sending
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn selected(&self) -> Option<MessageId> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_replaces_conversation_id_and_clears_error() {
        let mut state = SessionState::new();
        state.apply(SessionEvent::RequestFailed {
            error: "boom".into(),
            notice: None,
        });
        state.apply(SessionEvent::RequestStarted);
        state.apply(SessionEvent::RequestSucceeded {
            conversation_id: "first".into(),
            reply: Message::notice("one"),
        });
        state.apply(SessionEvent::RequestStarted);
        state.apply(SessionEvent::RequestSucceeded {
            conversation_id: "second".into(),
            reply: Message::notice("two"),
        });
        assert_eq!(state.conversation_id().map(|id| id.as_str()), Some("second"));
        assert_eq!(state.last_error(), None);
        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn abandon_only_resets_sending() {
        let mut state = SessionState::new();
        state.apply(SessionEvent::RecordingStarted);
        state.apply(SessionEvent::RequestAbandoned);
        assert_eq!(state.status(), SessionStatus::Recording);

        state.apply(SessionEvent::RecordingStopped);
        state.apply(SessionEvent::RequestStarted);
        state.apply(SessionEvent::RequestAbandoned);
        assert_eq!(state.status(), SessionStatus::Idle);
    }

    #[test]
    fn selection_does_not_touch_log() {
        let mut state = SessionState::new();
        let msg = Message::user("hello");
        let id = msg.id();
        state.apply(SessionEvent::UserMessage(msg));
        state.apply(SessionEvent::MessageSelected(id));
        assert_eq!(state.selected(), Some(id));
        assert_eq!(state.position(id), Some(0));
        assert_eq!(state.len(), 1);
        state.apply(SessionEvent::SelectionCleared);
        assert_eq!(state.selected(), None);
    }
}
