use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::id::MessageId;
use super::message::Message;
use super::request::{Completion, PendingRequest, Rejection, RequestKind, SendOutcome};
use super::state::{SessionEvent, SessionState, SessionStatus};
use crate::backend::AssistantBackend;
use crate::capture::{AudioCapture, UnavailableCapture, VoicePayload};

pub const CONNECTIVITY_ERROR: &str = "Failed to connect to the server. Please try again later.";
pub const MICROPHONE_ERROR: &str =
    "Could not access your microphone. Please check your permissions.";
pub const TEXT_FAILURE_NOTICE: &str = "Sorry, I encountered an error. Please try again.";
pub const VOICE_FAILURE_NOTICE: &str =
    "Sorry, I encountered an error processing your voice message.";

/// Owns the conversation and drives requests against a backend.
///
/// Sends come in two shapes. `send_text` / `send_voice` do the whole round
/// trip. `begin_*`, [`PendingRequest::dispatch`] and [`complete`] split it so
/// an event loop can keep running while the request is out.
///
/// A split request that is dropped instead of completed is picked up by
/// [`reap_abandoned`], which every admitting call runs first.
///
/// [`complete`]: SessionManager::complete
/// [`reap_abandoned`]: SessionManager::reap_abandoned
pub struct SessionManager {
    backend: Arc<dyn AssistantBackend>,
    capture: Box<dyn AudioCapture>,
    state: SessionState,
    /// Abandon flag of the request admitted last.
    in_flight: Option<Arc<AtomicBool>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AssistantBackend>) -> Self {
        Self {
            backend,
            capture: Box::new(UnavailableCapture),
            state: SessionState::new(),
            in_flight: None,
        }
    }

    pub fn with_capture(mut self, capture: Box<dyn AudioCapture>) -> Self {
        self.capture = capture;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn backend(&self) -> Arc<dyn AssistantBackend> {
        Arc::clone(&self.backend)
    }

    /// Admits a text question: appends the user message and marks the
    /// session as sending.
    pub fn begin_text(&mut self, body: &str) -> Result<PendingRequest, Rejection> {
        if body.trim().is_empty() {
            return Err(Rejection::EmptyMessage);
        }
        self.ensure_idle()?;
        let had_history = !self.state.is_empty();
        self.state.apply(SessionEvent::ErrorCleared);
        self.state
            .apply(SessionEvent::UserMessage(Message::user(body)));
        self.state.apply(SessionEvent::RequestStarted);
        log::debug!("text request admitted ({} chars)", body.chars().count());
        Ok(PendingRequest::text(
            body.to_string(),
            self.state.conversation_id().cloned(),
            had_history,
            self.track_request(),
        ))
    }

    /// Admits a voice question. No user message is logged for audio.
    pub fn begin_voice(&mut self, voice: VoicePayload) -> Result<PendingRequest, Rejection> {
        self.ensure_idle()?;
        let had_history = !self.state.is_empty();
        self.state.apply(SessionEvent::ErrorCleared);
        self.state.apply(SessionEvent::RequestStarted);
        log::debug!("voice request admitted ({} bytes)", voice.len());
        Ok(PendingRequest::voice(
            voice,
            self.state.conversation_id().cloned(),
            had_history,
            self.track_request(),
        ))
    }

    /// Folds a finished request back into the session.
    pub fn complete(&mut self, completion: Completion) -> SendOutcome {
        self.in_flight = None;
        reconcile(&mut self.state, completion)
    }

    /// Returns a `Sending` session to idle when its request was dropped
    /// without being completed. Returns whether it did.
    pub fn reap_abandoned(&mut self) -> bool {
        let abandoned = self
            .in_flight
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire));
        if !abandoned {
            return false;
        }
        self.in_flight = None;
        if self.state.status() != SessionStatus::Sending {
            return false;
        }
        log::warn!("request abandoned before completion");
        self.state.apply(SessionEvent::RequestAbandoned);
        true
    }

    pub async fn send_text(&mut self, body: &str) -> SendOutcome {
        match self.begin_text(body) {
            Ok(pending) => self.run(pending).await,
            Err(rejection) => SendOutcome::Rejected(rejection),
        }
    }

    pub async fn send_voice(&mut self, voice: VoicePayload) -> SendOutcome {
        match self.begin_voice(voice) {
            Ok(pending) => self.run(pending).await,
            Err(rejection) => SendOutcome::Rejected(rejection),
        }
    }

    pub fn start_recording(&mut self) -> Result<(), Rejection> {
        self.ensure_idle()?;
        self.state.apply(SessionEvent::ErrorCleared);
        match self.capture.start() {
            Ok(()) => {
                self.state.apply(SessionEvent::RecordingStarted);
                Ok(())
            }
            Err(err) => {
                log::error!("error accessing microphone: {err}");
                self.state
                    .apply(SessionEvent::CaptureFailed(MICROPHONE_ERROR.to_string()));
                Err(Rejection::CaptureFailed)
            }
        }
    }

    /// Stops the device and admits the finalized recording as a voice
    /// request.
    pub fn stop_recording(&mut self) -> Result<PendingRequest, Rejection> {
        if self.state.status() != SessionStatus::Recording {
            return Err(Rejection::NotRecording);
        }
        let voice = self.capture.stop();
        self.state.apply(SessionEvent::RecordingStopped);
        self.begin_voice(voice)
    }

    pub async fn finish_recording(&mut self) -> SendOutcome {
        match self.stop_recording() {
            Ok(pending) => self.run(pending).await,
            Err(rejection) => SendOutcome::Rejected(rejection),
        }
    }

    /// Marks `id` as the highlight target. Unknown ids are ignored.
    pub fn select_message(&mut self, id: MessageId) -> bool {
        if self.state.message(id).is_none() {
            return false;
        }
        self.state.apply(SessionEvent::MessageSelected(id));
        true
    }

    pub fn clear_selection(&mut self) {
        self.state.apply(SessionEvent::SelectionCleared);
    }

    pub fn clear_error(&mut self) {
        self.state.apply(SessionEvent::ErrorCleared);
    }

    fn ensure_idle(&mut self) -> Result<(), Rejection> {
        self.reap_abandoned();
        match self.state.status() {
            SessionStatus::Idle => Ok(()),
            SessionStatus::Sending => Err(Rejection::RequestInFlight),
            SessionStatus::Recording => Err(Rejection::RecordingActive),
        }
    }

    fn track_request(&mut self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(Arc::clone(&flag));
        flag
    }

    async fn run(&mut self, pending: PendingRequest) -> SendOutcome {
        let backend = Arc::clone(&self.backend);
        let guard = InFlight::new(&mut self.state);
        let completion = pending.dispatch(backend.as_ref()).await;
        let outcome = guard.finish(completion);
        self.in_flight = None;
        outcome
    }
}

fn reconcile(state: &mut SessionState, completion: Completion) -> SendOutcome {
    let (ticket, result) = completion.settle();
    match result {
        Ok(response) => {
            log::info!(
                "assistant replied with {} listing(s) in conversation {}",
                response.object_response.len(),
                response.conversation_id
            );
            state.apply(SessionEvent::RequestSucceeded {
                conversation_id: response.conversation_id,
                reply: Message::assistant(response.human_response, response.object_response),
            });
            SendOutcome::Answered
        }
        Err(err) => {
            match ticket.kind() {
                RequestKind::Text => log::error!("error sending message: {err}"),
                RequestKind::Voice => log::error!("error sending voice message: {err}"),
            }
            // Only a conversation that already had messages gets the notice.
            let notice = ticket.had_history().then(|| {
                Message::notice(match ticket.kind() {
                    RequestKind::Text => TEXT_FAILURE_NOTICE,
                    RequestKind::Voice => VOICE_FAILURE_NOTICE,
                })
            });
            state.apply(SessionEvent::RequestFailed {
                error: CONNECTIVITY_ERROR.to_string(),
                notice,
            });
            SendOutcome::Failed(err)
        }
    }
}

/// Returns the session to idle if the request future is dropped before it
/// reports back.
struct InFlight<'a> {
    state: &'a mut SessionState,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a mut SessionState) -> Self {
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self, completion: Completion) -> SendOutcome {
        self.finished = true;
        reconcile(&mut *self.state, completion)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("request dropped before completion");
            self.state.apply(SessionEvent::RequestAbandoned);
        }
    }
}
