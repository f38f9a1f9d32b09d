//! Ratatui-based terminal form.
//!
//! Shows the ten fields with their labels, help for the selected field, and
//! the submission state. Requests run through a `Dispatcher`; completions are
//! picked up on each loop tick.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::config::Settings;
use crate::domain::{Failure, FieldKey, SubmissionResult};
use crate::error::AppError;
use crate::form::{Dispatcher, PredictionForm, SubmitOutcome};
use crate::service::{HttpPredictionClient, PredictionService};
use crate::validate::{Bound, ValidationError};

const TICK: Duration = Duration::from_millis(100);

/// Start the TUI.
pub fn run(settings: &Settings) -> Result<(), AppError> {
    let client = HttpPredictionClient::new(settings)?;
    let mut app = App::new(Arc::new(client), settings.endpoint.to_string());

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What a key press asks the form to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Next,
    Prev,
    Submit,
    Reset,
    Input(char),
    Backspace,
}

fn action_for(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('r') if ctrl => Some(Action::Reset),
        KeyCode::Down | KeyCode::Tab => Some(Action::Next),
        KeyCode::Up | KeyCode::BackTab => Some(Action::Prev),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if !ctrl && accepts_char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

/// Characters a numeric input accepts. Whether they form a number is decided at submit.
fn accepts_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
}

struct App {
    form: PredictionForm,
    dispatcher: Dispatcher,
    selected: FieldKey,
    status: String,
    endpoint: String,
    received_at: Option<DateTime<Local>>,
}

impl App {
    fn new(service: Arc<dyn PredictionService>, endpoint: String) -> Self {
        Self {
            form: PredictionForm::new(),
            dispatcher: Dispatcher::new(service),
            selected: FieldKey::Age,
            status: "Fill in all ten fields, then press Enter.".to_string(),
            endpoint,
            received_at: None,
        }
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_completions() > 0 {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(TICK).map_err(|e| AppError::io(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let Some(action) = action_for(key) else {
                        continue;
                    };
                    if action == Action::Quit {
                        break;
                    }
                    self.apply(action);
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => {}
            Action::Next => self.selected = self.selected.next(),
            Action::Prev => self.selected = self.selected.prev(),
            Action::Input(c) => {
                let mut value = self.form.value(self.selected).to_string();
                value.push(c);
                self.form.on_field_change(self.selected, value);
            }
            Action::Backspace => {
                let mut value = self.form.value(self.selected).to_string();
                if value.pop().is_some() {
                    self.form.on_field_change(self.selected, value);
                }
            }
            Action::Submit => self.submit(),
            Action::Reset => {
                self.form.reset();
                self.selected = FieldKey::Age;
                self.received_at = None;
                self.status = "Form cleared.".to_string();
            }
        }
    }

    fn submit(&mut self) {
        match self.form.submit() {
            SubmitOutcome::Dispatch(ticket) => {
                self.status = format!("Sending to {}...", self.endpoint);
                self.dispatcher.dispatch(ticket);
            }
            SubmitOutcome::Rejected(err) => {
                if let Some(field) = err.field() {
                    self.selected = field;
                }
                self.status = "Fix the highlighted field(s) and try again.".to_string();
            }
            SubmitOutcome::Busy => {
                self.status = "A prediction is already in progress.".to_string();
            }
        }
    }

    /// Apply any finished requests. Returns how many changed the form.
    fn poll_completions(&mut self) -> usize {
        let applied = self.dispatcher.apply(&mut self.form);
        if applied > 0 {
            match self.form.result() {
                SubmissionResult::Success(_) => {
                    self.received_at = Some(Local::now());
                    self.status = "Prediction received.".to_string();
                }
                SubmissionResult::Failure(_) => {
                    self.status = "Request failed; details are in the log file.".to_string();
                }
                SubmissionResult::Idle | SubmissionResult::Pending => {}
            }
        }
        applied
    }

    /// Fields named by the current validation failure.
    fn flagged_fields(&self) -> Vec<FieldKey> {
        match self.form.result() {
            SubmissionResult::Failure(Failure::Invalid(err)) => match err {
                ValidationError::MissingFields(keys) => keys.clone(),
                ValidationError::NotANumber(key) => vec![*key],
                ValidationError::OutOfRange { field, .. } => vec![*field],
            },
            _ => Vec::new(),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("dpf", Style::default().fg(Color::Cyan)),
                Span::raw(" | Diabetes progression prediction"),
            ]),
            Line::from(Span::styled(
                format!("service: {}", self.endpoint),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.draw_fields(frame, chunks[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(chunks[1]);
        self.draw_help(frame, right[0]);
        self.draw_result(frame, right[1]);
    }

    fn draw_fields(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let flagged = self.flagged_fields();
        let items: Vec<ListItem> = FieldKey::ALL
            .iter()
            .map(|&key| {
                let value = self.form.value(key);
                let cursor = if key == self.selected { "_" } else { "" };
                let label_style = if flagged.contains(&key) {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<16}", key.label()), label_style),
                    Span::raw(format!("{value}{cursor}")),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Inputs").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected.index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_help(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let spec = self.selected.spec();
        let lines = vec![
            Line::from(Span::styled(
                spec.label,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(spec.help),
            Line::from(Span::styled(
                format!("Expected range {}", Bound::STANDARDIZED),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Field").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let button = if self.form.can_submit() {
            Span::styled(
                "[ Predict ]",
                Style::default().fg(Color::Black).bg(Color::Blue),
            )
        } else {
            Span::styled(
                "[ Predicting... ]",
                Style::default().fg(Color::Black).bg(Color::DarkGray),
            )
        };

        let mut lines = vec![Line::from(button), Line::from("")];
        match self.form.result() {
            SubmissionResult::Idle => lines.push(Line::from(Span::styled(
                "No prediction yet.",
                Style::default().fg(Color::Gray),
            ))),
            SubmissionResult::Pending => lines.push(Line::from(Span::styled(
                self.form.result().to_string(),
                Style::default().fg(Color::Yellow),
            ))),
            SubmissionResult::Success(_) => {
                lines.push(Line::from(Span::styled(
                    self.form.result().to_string(),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                if let Some(at) = self.received_at {
                    lines.push(Line::from(Span::styled(
                        format!("received {}", at.format("%H:%M:%S")),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
            SubmissionResult::Failure(failure) => lines.push(Line::from(Span::styled(
                failure.message(),
                Style::default().fg(Color::Red),
            ))),
        }

        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Result").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  type to edit  Enter predict  Ctrl-R reset  Esc quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}
