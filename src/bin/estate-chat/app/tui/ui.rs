use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use estate_chat::{Message, MessageId, SessionState, SessionStatus};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

use super::super::format::{listing_card, local_time, wrap_text};

const SIDEBAR_WIDTH: u16 = 34;
const HEADER_HEIGHT: u16 = 2;
const ERROR_HEIGHT: u16 = 1;
const INPUT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;
const TITLE: &str = "AI Real Estate Assistant";
const SUBTITLE: &str = "Your intelligent companion for Dubai properties";
const TITLE_HISTORY: &str = "Chat History";
const TITLE_MESSAGES: &str = "Conversation";
const TITLE_INPUT: &str = "Message";
const PLACEHOLDER_IDLE: &str = "Type your message...";
const PLACEHOLDER_SENDING: &str = "Please wait...";
const PLACEHOLDER_RECORDING: &str = "Recording... press Ctrl-R to stop";
const STATUS_IDLE: &str = "Enter send | Ctrl-R record | Up/Down history | Esc clear | Ctrl-C quit";
const STATUS_RECORDING: &str = "Recording... press Ctrl-R to stop and send";
const STATUS_SENDING: &str = "Waiting for the assistant...";

/// Terminal-only state; everything about the conversation lives in the
/// session.
#[derive(Debug, Default)]
pub struct UiState {
    input: String,
    preview_chars: usize,
}

impl UiState {
    pub fn new(preview_chars: usize) -> Self {
        Self {
            input: String::new(),
            preview_chars,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Step {
    Older,
    Newer,
}

/// Moves the history highlight one message up or down. With nothing
/// selected, `Older` starts from the newest message.
pub fn step_selection(
    messages: &[Message],
    selected: Option<MessageId>,
    step: Step,
) -> Option<MessageId> {
    let last = messages.len().checked_sub(1)?;
    let current = selected.and_then(|id| messages.iter().position(|m| m.id() == id));
    let next = match (current, step) {
        (None, Step::Older) => last,
        (None, Step::Newer) => return None,
        (Some(idx), Step::Older) => idx.saturating_sub(1),
        (Some(idx), Step::Newer) => (idx + 1).min(last),
    };
    Some(messages[next].id())
}

pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("failed to create terminal")?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, session: &SessionState, ui: &UiState) -> Result<()> {
        self.terminal.draw(|frame| render(frame, session, ui))?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        disable_raw_mode().context("failed to disable raw mode")?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .context("failed to leave alternate screen")?;
        self.terminal
            .show_cursor()
            .context("failed to show cursor")?;
        Ok(())
    }
}

fn render(frame: &mut Frame, session: &SessionState, ui: &UiState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(frame.area());
    render_history(frame, columns[0], session, ui.preview_chars);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(ERROR_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(columns[1]);
    render_header(frame, rows[0]);
    render_messages(frame, rows[1], session);
    render_error(frame, rows[2], session);
    render_input(frame, rows[3], session, ui);
    render_status(frame, rows[4], session);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::DarkGray))),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_history(frame: &mut Frame, area: Rect, session: &SessionState, preview_chars: usize) {
    let items: Vec<ListItem> = session
        .messages()
        .iter()
        .map(|message| {
            ListItem::new(vec![
                Line::from(message.preview(preview_chars)),
                Line::from(Span::styled(
                    local_time(message.timestamp()),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    let mut list_state =
        ListState::default().with_selected(session.selected().and_then(|id| session.position(id)));
    let list = List::new(items)
        .block(Block::default().title(TITLE_HISTORY).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Conversation lines plus the index of the first line of each message.
fn message_lines(session: &SessionState, width: usize) -> (Vec<Line<'static>>, Vec<usize>) {
    let mut lines = Vec::new();
    let mut starts = Vec::with_capacity(session.len());
    for message in session.messages() {
        starts.push(lines.len());
        let selected = session.selected() == Some(message.id());
        let (speaker, color) = if message.is_user() {
            ("You", Color::Cyan)
        } else {
            ("Assistant", Color::Green)
        };
        let mut header_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if selected {
            header_style = header_style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::styled(speaker, header_style),
            Span::styled(
                format!("  {}", local_time(message.timestamp())),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        for line in wrap_text(message.text(), width) {
            lines.push(Line::from(line));
        }
        for listing in message.listings() {
            lines.push(Line::default());
            for line in listing_card(listing) {
                lines.push(Line::from(Span::styled(
                    line,
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
        lines.push(Line::default());
    }
    (lines, starts)
}

fn render_messages(frame: &mut Frame, area: Rect, session: &SessionState) {
    let block = Block::default().title(TITLE_MESSAGES).borders(Borders::ALL);
    let inner = block.inner(area);
    let (lines, starts) = message_lines(session, inner.width as usize);
    let height = inner.height as usize;
    let bottom = lines.len().saturating_sub(height);
    let offset = session
        .selected()
        .and_then(|id| session.position(id))
        .and_then(|idx| starts.get(idx).copied())
        .map_or(bottom, |start| start.min(bottom));
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn render_error(frame: &mut Frame, area: Rect, session: &SessionState) {
    let text = session.last_error().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Red)),
        area,
    );
}

fn render_input(frame: &mut Frame, area: Rect, session: &SessionState, ui: &UiState) {
    let (text, style) = match session.status() {
        SessionStatus::Sending => (PLACEHOLDER_SENDING, Style::default().fg(Color::DarkGray)),
        SessionStatus::Recording => (
            PLACEHOLDER_RECORDING,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        SessionStatus::Idle if ui.input.is_empty() => {
            (PLACEHOLDER_IDLE, Style::default().fg(Color::DarkGray))
        }
        SessionStatus::Idle => (ui.input.as_str(), Style::default()),
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().title(TITLE_INPUT).borders(Borders::ALL)),
        area,
    );
}

fn render_status(frame: &mut Frame, area: Rect, session: &SessionState) {
    let (text, style) = match session.status() {
        SessionStatus::Idle => (STATUS_IDLE, Style::default().fg(Color::Green)),
        SessionStatus::Recording => (
            STATUS_RECORDING,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        SessionStatus::Sending => (STATUS_SENDING, Style::default().fg(Color::Yellow)),
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}
