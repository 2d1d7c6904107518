//! Conversation session: the message log, the server conversation id and
//! the idle / recording / sending status.

mod id;
mod manager;
mod message;
mod request;
mod state;


pub use id::{ConversationId, MessageId};
pub use manager::{
    SessionManager, CONNECTIVITY_ERROR, MICROPHONE_ERROR, TEXT_FAILURE_NOTICE,
    VOICE_FAILURE_NOTICE,
};
pub use message::{Message, Role};
pub use request::{Completion, PendingRequest, Rejection, RequestKind, RequestTicket, SendOutcome};
pub use state::{SessionEvent, SessionState, SessionStatus};
