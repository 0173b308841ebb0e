use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    path::Path,
    time::{Duration, Instant},
};

use crate::chat::{AttachmentFile, ConversationStore, MessageDispatcher, Notice, PendingSend};
use crate::config::Settings;
use crate::tui::ui::render_ui;

/// Input mode for the TUI
enum InputMode {
    Normal,
    Editing,
}

/// What a submitted line asks for
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Attach(&'a str),
    Detach(Option<&'a str>),
    Clear,
    Send(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    if let Some(path) = trimmed.strip_prefix("/attach ") {
        return Command::Attach(path.trim());
    }
    if let Some(name) = trimmed.strip_prefix("/detach ") {
        return Command::Detach(Some(name.trim()));
    }
    match trimmed {
        "/detach" => Command::Detach(None),
        "/clear" => Command::Clear,
        _ => Command::Send(line),
    }
}

/// TUI application state
pub struct ChatApp {
    dispatcher: MessageDispatcher,
    settings: Settings,

    // Composer state
    input: String,
    input_history: Vec<String>,
    input_history_index: usize,
    attachments: Vec<AttachmentFile>,

    // Send waiting for its request to be made
    queued: Option<PendingSend>,

    // Latest notice shown in the status bar
    notice: Option<Notice>,
}

impl ChatApp {
    pub fn new(dispatcher: MessageDispatcher, settings: Settings) -> Self {
        Self {
            dispatcher,
            settings,
            input: String::new(),
            input_history: Vec::new(),
            input_history_index: 0,
            attachments: Vec::new(),
            queued: None,
            notice: None,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        self.dispatcher.store()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attachments(&self) -> &[AttachmentFile] {
        &self.attachments
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    fn handle_input(&mut self, c: char) {
        self.input.push(c);
    }

    fn backspace(&mut self) {
        self.input.pop();
    }

    /// Go to the previous input in history
    fn previous_input(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.input_history_index > 0 {
            self.input_history_index -= 1;
            self.input = self.input_history[self.input_history_index].clone();
        }
    }

    /// Go to the next input in history
    fn next_input(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.input_history_index < self.input_history.len() - 1 {
            self.input_history_index += 1;
            self.input = self.input_history[self.input_history_index].clone();
        } else {
            self.input_history_index = self.input_history.len();
            self.input.clear();
        }
    }

    fn remember_input(&mut self) {
        if !self.input.trim().is_empty() {
            self.input_history.push(self.input.clone());
            self.input_history_index = self.input_history.len();
        }
    }

    /// Act on the current input line
    fn submit(&mut self) {
        let line = self.input.clone();

        match parse_command(&line) {
            Command::Attach(path) => {
                self.attach(path);
                self.remember_input();
                self.input.clear();
            }
            Command::Detach(name) => {
                self.detach(name);
                self.input.clear();
            }
            Command::Clear => {
                self.clear_conversation();
                self.input.clear();
            }
            Command::Send(text) => {
                if self.is_busy() {
                    return;
                }
                let files = std::mem::take(&mut self.attachments);
                if let Some(pending) = self.dispatcher.begin(text, files) {
                    self.queued = Some(pending);
                    self.remember_input();
                    self.input.clear();
                }
            }
        }
    }

    fn attach(&mut self, path: &str) {
        if !self.settings.attachments_allowed {
            self.notice = Some(Notice::error("Cannot attach file", "attachments are disabled"));
            return;
        }
        if path.is_empty() || !Path::new(path).is_file() {
            self.notice = Some(Notice::error("Cannot attach file", format!("'{}' is not a file", path)));
            return;
        }
        self.attachments.push(AttachmentFile::from_path(path));
    }

    /// Drop one queued file by name, or all of them
    fn detach(&mut self, name: Option<&str>) {
        let Some(name) = name else {
            self.attachments.clear();
            return;
        };
        match self.attachments.iter().position(|a| a.name == name) {
            Some(index) => {
                self.attachments.remove(index);
            }
            None => {
                self.notice = Some(Notice::error(
                    "Cannot detach file",
                    format!("'{}' is not attached", name),
                ));
            }
        }
    }

    fn clear_conversation(&mut self) {
        self.dispatcher.clear_conversation();
        self.pull_notices();
    }

    fn pull_notices(&mut self) {
        if let Some(latest) = self.dispatcher.take_notices().pop() {
            self.notice = Some(latest);
        }
    }

    /// Finish a queued send, if any
    async fn process_queued(&mut self) -> bool {
        match self.queued.take() {
            Some(pending) => {
                self.dispatcher.complete(pending).await;
                self.pull_notices();
                true
            }
            None => false,
        }
    }
}

/// TUI-specific state
struct TuiState {
    input_mode: InputMode,
    last_tick: Instant,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Editing,
            last_tick: Instant::now(),
        }
    }
}

/// Run the TUI application
pub async fn run(dispatcher: MessageDispatcher, settings: Settings) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = ChatApp::new(dispatcher, settings);
    let mut state = TuiState::default();

    let tick_rate = Duration::from_millis(100);
    let result = run_app(&mut terminal, &mut app, &mut state, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp,
    state: &mut TuiState,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        // The user message has been drawn; now make the request
        if app.process_queued().await {
            continue;
        }

        let timeout = tick_rate
            .checked_sub(state.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match state.input_mode {
                        InputMode::Normal => match key.code {
                            KeyCode::Char('e') => {
                                state.input_mode = InputMode::Editing;
                            }
                            KeyCode::Char('c') => {
                                app.clear_conversation();
                            }
                            KeyCode::Char('q') => {
                                return Ok(());
                            }
                            _ => {}
                        },
                        InputMode::Editing => match key.code {
                            KeyCode::Enter => app.submit(),
                            KeyCode::Esc => {
                                state.input_mode = InputMode::Normal;
                            }
                            KeyCode::Char(c) => app.handle_input(c),
                            KeyCode::Backspace => app.backspace(),
                            KeyCode::Up => app.previous_input(),
                            KeyCode::Down => app.next_input(),
                            _ => {}
                        },
                    }
                }
            }
        }

        if state.last_tick.elapsed() >= tick_rate {
            state.last_tick = Instant::now();
        }
    }
}
