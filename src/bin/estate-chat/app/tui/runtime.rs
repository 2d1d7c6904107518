use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use estate_chat::capture::AudioCapture;
use estate_chat::session::{Completion, PendingRequest, Rejection};
use estate_chat::{AssistantBackend, HttpBackend, SendOutcome, SessionManager};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use super::ui::{step_selection, Step, TerminalSession, UiState};
use crate::config::AppConfig;

const UI_POLL_MS: u64 = 50;

pub fn run(config: AppConfig, backend: HttpBackend, handle: Handle) -> Result<()> {
    let (ui_tx, ui_rx) = mpsc::channel::<AppMessage>();
    let session =
        SessionManager::new(Arc::new(backend)).with_capture(build_capture(&config));
    let services = DispatchContext::new(handle, session.backend(), ui_tx);
    let terminal = TerminalSession::new()?;
    let mut ui_ctx = UiContext {
        ui: UiState::new(config.ui.history_preview_chars),
        session,
        terminal,
        rx: ui_rx,
        services,
    };
    let result = ui_ctx.run_loop();
    let restore = ui_ctx.restore_terminal();
    restore?;
    result
}

#[cfg(feature = "microphone")]
fn build_capture(config: &AppConfig) -> Box<dyn AudioCapture> {
    Box::new(estate_chat::capture::MicrophoneRecorder::new(
        config.capture.max_record_seconds,
    ))
}

#[cfg(not(feature = "microphone"))]
fn build_capture(_config: &AppConfig) -> Box<dyn AudioCapture> {
    log::info!("built without the microphone feature; voice input is disabled");
    Box::new(estate_chat::capture::UnavailableCapture)
}

enum AppMessage {
    Completed(Completion),
}

/// Sends admitted requests on the tokio runtime and reports back over the
/// UI channel.
struct DispatchContext {
    handle: Handle,
    backend: Arc<dyn AssistantBackend>,
    ui_tx: Sender<AppMessage>,
}

impl DispatchContext {
    fn new(handle: Handle, backend: Arc<dyn AssistantBackend>, ui_tx: Sender<AppMessage>) -> Self {
        Self {
            handle,
            backend,
            ui_tx,
        }
    }

    fn spawn_dispatch(&self, pending: PendingRequest) {
        let backend = Arc::clone(&self.backend);
        let ui_tx = self.ui_tx.clone();
        self.handle.spawn(async move {
            let completion = pending.dispatch(backend.as_ref()).await;
            if ui_tx.send(AppMessage::Completed(completion)).is_err() {
                log::debug!("UI closed before the request completed");
            }
        });
    }
}

struct UiContext {
    ui: UiState,
    session: SessionManager,
    terminal: TerminalSession,
    rx: Receiver<AppMessage>,
    services: DispatchContext,
}

impl UiContext {
    fn run_loop(&mut self) -> Result<()> {
        loop {
            self.drain_messages();
            self.terminal.draw(self.session.state(), &self.ui)?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }

    fn restore_terminal(&mut self) -> Result<()> {
        self.terminal.restore()
    }

    fn drain_messages(&mut self) {
        for msg in self.rx.try_iter() {
            match msg {
                AppMessage::Completed(completion) => {
                    if let SendOutcome::Failed(err) = self.session.complete(completion) {
                        log::debug!("request failed with status {:?}", err.status());
                    }
                }
            }
        }
        // A dispatch task that panicked or was cancelled never reports back.
        self.session.reap_abandoned();
    }

    fn handle_input(&mut self) -> Result<bool> {
        if !event::poll(Duration::from_millis(UI_POLL_MS))? {
            return Ok(false);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(false);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        Ok(self.handle_key(key))
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = key_action(key) else {
            return false;
        };
        match action {
            KeyAction::Quit => return true,
            KeyAction::ToggleRecording => self.toggle_recording(),
            KeyAction::Send => self.send_input(),
            KeyAction::Select(step) => self.move_selection(step),
            KeyAction::Dismiss => dismiss(&mut self.session),
            KeyAction::Backspace if self.input_enabled() => self.ui.backspace(),
            KeyAction::Type(ch) if self.input_enabled() => self.ui.push_char(ch),
            KeyAction::Backspace | KeyAction::Type(_) => {}
        }
        false
    }

    fn input_enabled(&self) -> bool {
        !self.session.state().is_sending() && !self.session.state().is_recording()
    }

    fn send_input(&mut self) {
        match self.session.begin_text(self.ui.input()) {
            Ok(pending) => {
                self.ui.clear_input();
                self.services.spawn_dispatch(pending);
            }
            Err(rejection) => log::debug!("send ignored: {rejection}"),
        }
    }

    fn toggle_recording(&mut self) {
        if self.session.state().is_recording() {
            match self.session.stop_recording() {
                Ok(pending) => self.services.spawn_dispatch(pending),
                Err(rejection) => log::debug!("stop recording ignored: {rejection}"),
            }
            return;
        }
        match self.session.start_recording() {
            Ok(()) => log::debug!("recording started"),
            // The session already carries the message shown to the user.
            Err(Rejection::CaptureFailed) => {}
            Err(rejection) => log::debug!("recording ignored: {rejection}"),
        }
    }

    fn move_selection(&mut self, step: Step) {
        let state = self.session.state();
        match step_selection(state.messages(), state.selected(), step) {
            Some(id) => {
                self.session.select_message(id);
            }
            None => self.session.clear_selection(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum KeyAction {
    Quit,
    ToggleRecording,
    Send,
    Select(Step),
    Dismiss,
    Backspace,
    Type(char),
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('r') if ctrl => KeyAction::ToggleRecording,
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::Char(ch) => KeyAction::Type(ch),
        KeyCode::Enter => KeyAction::Send,
        KeyCode::Up => KeyAction::Select(Step::Older),
        KeyCode::Down => KeyAction::Select(Step::Newer),
        KeyCode::Esc => KeyAction::Dismiss,
        KeyCode::Backspace => KeyAction::Backspace,
        _ => return None,
    };
    Some(action)
}

/// Esc: back to follow-the-bottom and hide the error line.
fn dismiss(session: &mut SessionManager) {
    session.clear_selection();
    session.clear_error();
}
