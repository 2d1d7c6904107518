use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::id::ConversationId;
use crate::backend::{AskRequest, AskResponse, AssistantBackend};
use crate::capture::VoicePayload;
use crate::error::AssistantError;

/// Why a send or recording request was turned away without side effects.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum Rejection {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a request is already in flight")]
    RequestInFlight,
    #[error("a recording is in progress")]
    RecordingActive,
    #[error("no recording is in progress")]
    NotRecording,
    /// The capture device could not be opened; the session error is set.
    #[error("microphone unavailable")]
    CaptureFailed,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RequestKind {
    Text,
    Voice,
}

/// Result of a send as seen by the caller. Failures are already recorded in
/// the session; the error is handed back for logging only.
#[derive(Debug)]
pub enum SendOutcome {
    Answered,
    Failed(AssistantError),
    Rejected(Rejection),
}

impl SendOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, SendOutcome::Answered)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            SendOutcome::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

/// Bookkeeping carried from `begin_*` to `complete`.
#[derive(Debug, Clone, Copy)]
pub struct RequestTicket {
    kind: RequestKind,
    had_history: bool,
}

impl RequestTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Whether the log held any message before this request began.
    pub fn had_history(&self) -> bool {
        self.had_history
    }
}

/// Raises the session's abandon flag if a request is dropped before
/// `complete` sees it.
#[derive(Debug)]
struct AbandonGuard {
    abandoned: Arc<AtomicBool>,
    armed: bool,
}

impl AbandonGuard {
    fn new(abandoned: Arc<AtomicBool>) -> Self {
        Self {
            abandoned,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.store(true, Ordering::Release);
        }
    }
}

#[derive(Debug)]
enum Payload {
    Text(AskRequest),
    Voice {
        voice: VoicePayload,
        conversation_id: Option<ConversationId>,
    },
}

/// A request that has been admitted by the session but not sent yet.
///
/// Dispatching needs no access to the session, so it can run on another
/// task while the UI keeps drawing. Dropping the request, its dispatch
/// future or the resulting [`Completion`] without handing it to
/// `SessionManager::complete` marks the request abandoned; the session
/// returns to idle on its next call.
#[derive(Debug)]
pub struct PendingRequest {
    ticket: RequestTicket,
    payload: Payload,
    guard: AbandonGuard,
}

impl PendingRequest {
    pub(super) fn text(
        question: String,
        conversation_id: Option<ConversationId>,
        had_history: bool,
        abandoned: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ticket: RequestTicket {
                kind: RequestKind::Text,
                had_history,
            },
            payload: Payload::Text(AskRequest {
                question,
                conversation_id,
            }),
            guard: AbandonGuard::new(abandoned),
        }
    }

    pub(super) fn voice(
        voice: VoicePayload,
        conversation_id: Option<ConversationId>,
        had_history: bool,
        abandoned: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ticket: RequestTicket {
                kind: RequestKind::Voice,
                had_history,
            },
            payload: Payload::Voice {
                voice,
                conversation_id,
            },
            guard: AbandonGuard::new(abandoned),
        }
    }

    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    pub fn kind(&self) -> RequestKind {
        self.ticket.kind
    }

    /// Sends the request and pairs the backend's answer with its ticket.
    pub async fn dispatch(self, backend: &dyn AssistantBackend) -> Completion {
        let PendingRequest {
            ticket,
            payload,
            guard,
        } = self;
        let result = match payload {
            Payload::Text(request) => backend.ask(&request).await,
            Payload::Voice {
                voice,
                conversation_id,
            } => backend.ask_voice(voice, conversation_id.as_ref()).await,
        };
        Completion {
            ticket,
            result,
            guard,
        }
    }
}

/// A finished request, ready to be folded back into the session.
#[derive(Debug)]
pub struct Completion {
    pub ticket: RequestTicket,
    pub result: Result<AskResponse, AssistantError>,
    guard: AbandonGuard,
}

impl Completion {
    /// Splits off the ticket and result, settling the request.
    pub(super) fn settle(self) -> (RequestTicket, Result<AskResponse, AssistantError>) {
        let Completion {
            ticket,
            result,
            mut guard,
        } = self;
        guard.disarm();
        (ticket, result)
    }
}
