//! Application state and key handling.
//!
//! `App` owns every piece of UI state: the command rows, the shared output
//! pane, scroll state, input prompts, and the status bar. It is only ever
//! mutated on the event loop; worker tasks reach it exclusively through
//! events, and file or process side effects are returned to the loop as an
//! `AppAction` instead of being performed here.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::output::{LogBuffer, LogLine, StreamKind};
use crate::process::{CommandEntry, CommandRow, CommandStatus, RowId};
use crate::runner::wants_password;
use crate::settings::DisplaySettings;

/// What the user is currently typing, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Standard navigation mode.
    Normal,
    /// First step of creating a command: the label.
    NewLabel,
    /// Second step of creating a command: the command line.
    NewCommand { label: String },
    /// Editing the command line of an existing row.
    EditCommand { id: RowId },
    /// Editing the extra arguments of a row.
    ExtraArgs { id: RowId },
    /// Masked sudo password prompt for a pending start.
    Password { id: RowId },
    /// First step of the settings dialog: the pane height.
    SettingsHeight,
    /// Second step of the settings dialog: the pane width.
    SettingsWidth { height: String },
}

/// Side effects the event loop must carry out against the runner or the
/// stores after a key was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// No action required.
    None,
    /// Exit the application.
    Quit,
    /// Start the row's command, with an optional sudo password.
    Start { id: RowId, password: Option<String> },
    /// Force-terminate the row's command.
    Stop(RowId),
    /// Stop (if running) and remove the row, then persist the list.
    Delete(RowId),
    /// Append the freshly created entry to the commands file.
    AppendEntry(CommandEntry),
    /// Rewrite the commands file from the current rows.
    SaveEntries,
    /// Re-read the commands file, stopping running rows first.
    Reload,
    /// Write the display settings file.
    SaveSettings,
    /// Copy the output pane to the clipboard.
    CopyLog,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    at: Instant,
    ttl: Duration,
}

/// The main application state container.
#[derive(Debug)]
pub struct App {
    /// One row per configured command, in file order.
    pub rows: Vec<CommandRow>,
    /// Index of the currently selected row.
    pub selected: usize,
    /// Output pane size, as loaded from the settings file.
    pub settings: DisplaySettings,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Buffer for the active prompt.
    pub input: String,
    /// The shared output pane.
    pub log: LogBuffer,
    /// Scroll offset into the pane, used while follow is off.
    pub log_scroll: usize,
    /// Whether the pane sticks to the newest line.
    pub follow: bool,
    /// Height of the log view area, set during drawing.
    pub log_view_height: usize,
    /// Flag indicating that the application should exit.
    pub should_quit: bool,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    next_id: u64,
    status_message: Option<StatusMessage>,
}

impl App {
    /// Creates the application state from persisted entries and settings.
    pub fn new(entries: Vec<CommandEntry>, settings: DisplaySettings, max_lines: usize) -> Self {
        let mut app = Self {
            rows: Vec::new(),
            selected: 0,
            settings,
            input_mode: InputMode::Normal,
            input: String::new(),
            log: LogBuffer::new(max_lines),
            log_scroll: 0,
            follow: true,
            log_view_height: 0,
            should_quit: false,
            show_help: false,
            next_id: 0,
            status_message: None,
        };
        for entry in entries {
            let id = app.alloc_id();
            app.rows.push(CommandRow::new(id, entry));
        }
        app
    }

    fn alloc_id(&mut self) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn row(&self, id: RowId) -> Option<&CommandRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    fn row_mut(&mut self, id: RowId) -> Option<&mut CommandRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    pub fn selected_row(&self) -> Option<&CommandRow> {
        self.rows.get(self.selected)
    }

    /// Snapshot of the persisted entries, in row order.
    pub fn entries(&self) -> Vec<CommandEntry> {
        self.rows.iter().map(|row| row.entry.clone()).collect()
    }

    /// Rows that currently have (or are acquiring) a child process.
    pub fn running_ids(&self) -> Vec<RowId> {
        self.rows
            .iter()
            .filter(|row| row.status != CommandStatus::Idle)
            .map(|row| row.id)
            .collect()
    }

    /// Adds a notice line produced by cmdboard itself to the output pane.
    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.push_log(&text.into(), StreamKind::Notice);
    }

    fn push_log(&mut self, text: &str, stream: StreamKind) {
        for line in text.split('\n') {
            self.log.push(LogLine {
                text: line.to_string(),
                stream,
            });
        }
    }

    /// Begins a start for the row, returning the composed command line.
    ///
    /// Refused (with a status message) unless the row is idle, so a row never
    /// has more than one child. Clears the output pane for the new run.
    pub fn begin_start(&mut self, id: RowId) -> Option<String> {
        let Some(row) = self.row_mut(id) else {
            return None;
        };
        if row.status != CommandStatus::Idle {
            let label = row.entry.label.clone();
            self.set_status_message(format!("{} is already running", label));
            return None;
        }
        row.status = CommandStatus::Starting;
        row.pid = None;
        row.last_exit = None;
        let line = row.composed_command_line();
        let label = row.entry.label.clone();
        self.log.clear();
        self.log_scroll = 0;
        self.follow = true;
        self.set_status_message(format!("Starting {}", label));
        Some(line)
    }

    pub fn on_command_started(&mut self, id: RowId, pid: u32) {
        if let Some(row) = self.row_mut(id) {
            row.status = CommandStatus::Running;
            row.pid = Some(pid);
        }
    }

    pub fn on_command_output(&mut self, id: RowId, text: &str, stream: StreamKind) {
        if self.row(id).is_none() {
            return;
        }
        self.push_log(text, stream);
    }

    pub fn on_command_exited(&mut self, id: RowId, code: Option<i32>) {
        let Some(row) = self.row_mut(id) else {
            return;
        };
        row.status = CommandStatus::Idle;
        row.pid = None;
        row.last_exit = code;
        let label = row.entry.label.clone();
        let message = match code {
            Some(0) => format!("{} exited successfully", label),
            Some(code) => format!("{} exited with code {}", label, code),
            None => format!("{} exited", label),
        };
        self.push_notice(message.clone());
        self.set_status_message(message);
    }

    pub fn on_command_failed(&mut self, id: RowId, error: &str) {
        let Some(row) = self.row_mut(id) else {
            return;
        };
        row.status = CommandStatus::Idle;
        row.pid = None;
        self.push_notice(format!("Error: {}", error));
    }

    pub fn on_command_killed(&mut self, id: RowId) {
        let Some(row) = self.row_mut(id) else {
            return;
        };
        row.status = CommandStatus::Idle;
        row.pid = None;
        let label = row.entry.label.clone();
        self.push_notice(format!("Command '{}' terminated by user.", label));
    }

    /// Removes a row; the caller has already stopped its child.
    pub fn remove_row(&mut self, id: RowId) {
        let Some(index) = self.rows.iter().position(|row| row.id == id) else {
            return;
        };
        let row = self.rows.remove(index);
        if self.selected >= self.rows.len() && self.selected > 0 {
            self.selected -= 1;
        }
        self.push_notice(format!("Deleted '{}'", row.entry.label));
    }

    /// Appends a new row, refusing duplicate labels.
    fn create_row(&mut self, entry: CommandEntry) -> bool {
        if self.rows.iter().any(|row| row.entry.label == entry.label) {
            self.push_notice(format!("A command named '{}' already exists", entry.label));
            return false;
        }
        let id = self.alloc_id();
        self.rows.push(CommandRow::new(id, entry));
        self.selected = self.rows.len() - 1;
        true
    }

    /// Replaces every row after a reload; running rows were stopped first.
    pub fn replace_rows(&mut self, entries: Vec<CommandEntry>) {
        self.rows.clear();
        for entry in entries {
            let id = self.alloc_id();
            self.rows.push(CommandRow::new(id, entry));
        }
        self.selected = 0;
        self.push_notice(format!("Reloaded {} commands", self.rows.len()));
    }

    /// The whole output pane as plain text, for the clipboard.
    pub fn log_text(&self) -> Option<String> {
        if self.log.is_empty() {
            return None;
        }
        let lines: Vec<&str> = self.log.iter().map(|line| line.text.as_str()).collect();
        Some(lines.join("\n"))
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: message.into(),
            at: Instant::now(),
            ttl: Duration::from_secs(3),
        });
    }

    pub fn status_message(&self) -> Option<&str> {
        let message = self.status_message.as_ref()?;
        (message.at.elapsed() < message.ttl).then_some(message.text.as_str())
    }

    /// The prompt shown in the status bar while typing, masked for passwords.
    pub fn prompt_line(&self) -> Option<String> {
        match &self.input_mode {
            InputMode::Normal => None,
            InputMode::NewLabel => Some(format!("Label: {}", self.input)),
            InputMode::NewCommand { label } => {
                Some(format!("Command for '{}': {}", label, self.input))
            }
            InputMode::EditCommand { .. } => Some(format!("Command: {}", self.input)),
            InputMode::ExtraArgs { .. } => Some(format!("Extra arguments: {}", self.input)),
            InputMode::Password { .. } => {
                Some(format!("Sudo password: {}", "*".repeat(self.input.chars().count())))
            }
            InputMode::SettingsHeight => Some(format!("Output height: {}", self.input)),
            InputMode::SettingsWidth { .. } => Some(format!("Output width: {}", self.input)),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        match self.input_mode.clone() {
            InputMode::Normal => self.handle_normal_key(key),
            mode => self.handle_prompt_key(key, mode),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_up(3),
            MouseEventKind::ScrollDown => self.scroll_down(3),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                AppAction::Quit
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                AppAction::Quit
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                AppAction::None
            }
            KeyCode::Down => {
                if self.selected + 1 < self.rows.len() {
                    self.selected += 1;
                }
                AppAction::None
            }
            KeyCode::Tab => {
                if !self.rows.is_empty() {
                    self.selected = (self.selected + 1) % self.rows.len();
                }
                AppAction::None
            }
            KeyCode::Enter | KeyCode::Char('s') => self.request_start(),
            KeyCode::Char('k') => match self.selected_row() {
                Some(row) => AppAction::Stop(row.id),
                None => AppAction::None,
            },
            KeyCode::Char('d') => match self.selected_row() {
                Some(row) => AppAction::Delete(row.id),
                None => AppAction::None,
            },
            KeyCode::Char('n') => {
                self.input_mode = InputMode::NewLabel;
                self.input.clear();
                AppAction::None
            }
            KeyCode::Char('e') => {
                if let Some(row) = self.selected_row() {
                    let id = row.id;
                    let line = row.entry.command_line.clone();
                    self.input = line;
                    self.input_mode = InputMode::EditCommand { id };
                }
                AppAction::None
            }
            KeyCode::Char('a') => {
                if let Some(row) = self.selected_row() {
                    let id = row.id;
                    let args = row.extra_args.clone();
                    self.input = args;
                    self.input_mode = InputMode::ExtraArgs { id };
                }
                AppAction::None
            }
            KeyCode::Char('r') => AppAction::Reload,
            KeyCode::Char('o') => {
                self.input = self.settings.height.to_string();
                self.input_mode = InputMode::SettingsHeight;
                AppAction::None
            }
            KeyCode::Char('y') => AppAction::CopyLog,
            KeyCode::Char('f') => {
                self.follow = !self.follow;
                AppAction::None
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                AppAction::None
            }
            KeyCode::Esc => {
                self.show_help = false;
                AppAction::None
            }
            KeyCode::PageUp => {
                self.scroll_up(self.log_view_height.max(1));
                AppAction::None
            }
            KeyCode::PageDown => {
                self.scroll_down(self.log_view_height.max(1));
                AppAction::None
            }
            KeyCode::Home => {
                self.log_scroll = 0;
                self.follow = false;
                AppAction::None
            }
            KeyCode::End => {
                self.follow = true;
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    // Start the selected row, going through the password prompt when the
    // composed command mentions sudo.
    fn request_start(&mut self) -> AppAction {
        let Some(row) = self.selected_row() else {
            return AppAction::None;
        };
        let id = row.id;
        if row.status != CommandStatus::Idle {
            let label = row.entry.label.clone();
            self.set_status_message(format!("{} is already running", label));
            return AppAction::None;
        }
        if wants_password(&row.composed_command_line()) {
            self.input.clear();
            self.input_mode = InputMode::Password { id };
            return AppAction::None;
        }
        AppAction::Start { id, password: None }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, mode: InputMode) -> AppAction {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
                AppAction::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                AppAction::None
            }
            KeyCode::Enter => self.submit_prompt(mode),
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return AppAction::None;
                }
                self.input.push(c);
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    fn submit_prompt(&mut self, mode: InputMode) -> AppAction {
        let raw = std::mem::take(&mut self.input);
        self.input_mode = InputMode::Normal;
        match mode {
            InputMode::Normal => AppAction::None,
            InputMode::NewLabel => {
                let label = raw.trim().to_string();
                if label.is_empty() {
                    self.push_notice("Label must not be empty");
                    return AppAction::None;
                }
                self.input_mode = InputMode::NewCommand { label };
                AppAction::None
            }
            InputMode::NewCommand { label } => {
                let command_line = raw.trim().to_string();
                if command_line.is_empty() {
                    self.push_notice("Command must not be empty");
                    return AppAction::None;
                }
                let entry = CommandEntry {
                    label,
                    command_line,
                };
                if self.create_row(entry.clone()) {
                    AppAction::AppendEntry(entry)
                } else {
                    AppAction::None
                }
            }
            InputMode::EditCommand { id } => {
                let command_line = raw.trim().to_string();
                if command_line.is_empty() {
                    self.push_notice("Command must not be empty");
                    return AppAction::None;
                }
                match self.row_mut(id) {
                    Some(row) => {
                        row.entry.command_line = command_line;
                        AppAction::SaveEntries
                    }
                    None => AppAction::None,
                }
            }
            InputMode::ExtraArgs { id } => {
                if let Some(row) = self.row_mut(id) {
                    row.extra_args = raw;
                }
                AppAction::None
            }
            InputMode::Password { id } => AppAction::Start {
                id,
                password: Some(raw),
            },
            InputMode::SettingsHeight => {
                self.input_mode = InputMode::SettingsWidth { height: raw };
                self.input = self.settings.width.to_string();
                AppAction::None
            }
            InputMode::SettingsWidth { height } => {
                let parsed = height
                    .trim()
                    .parse::<i64>()
                    .and_then(|h| raw.trim().parse::<i64>().map(|w| (h, w)));
                match parsed {
                    Ok((height, width)) => {
                        self.settings = DisplaySettings { height, width };
                        AppAction::SaveSettings
                    }
                    Err(_) => {
                        self.push_notice(
                            "Invalid input for height or width. Please enter valid integers.",
                        );
                        AppAction::None
                    }
                }
            }
        }
    }

    pub fn scroll_up(&mut self, amount: usize) {
        let view = self.log_view_height.max(1);
        let max_scroll = self.log.len().saturating_sub(view);
        let current = if self.follow { max_scroll } else { self.log_scroll };
        self.log_scroll = current.saturating_sub(amount).min(max_scroll);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, amount: usize) {
        let view = self.log_view_height.max(1);
        let max_scroll = self.log.len().saturating_sub(view);
        let current = if self.follow { max_scroll } else { self.log_scroll };
        let next = (current + amount).min(max_scroll);
        self.log_scroll = next;
        self.follow = next == max_scroll;
    }

    /// Summary of the selected row for the status bar.
    pub fn status_line(&self) -> String {
        let Some(row) = self.selected_row() else {
            return "No commands - press n to create one".to_string();
        };
        let status = match row.status {
            CommandStatus::Idle => match row.last_exit {
                Some(code) => format!("idle (last exit {})", code),
                None => "idle".to_string(),
            },
            CommandStatus::Starting => "starting".to_string(),
            CommandStatus::Running => "running".to_string(),
        };
        let pid = row
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "none".into());
        format!(
            "{} | status: {} | PID: {} | lines: {} | follow: {}",
            row.entry.label,
            status,
            pid,
            self.log.len(),
            if self.follow { "on" } else { "off" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, command_line: &str) -> CommandEntry {
        CommandEntry {
            label: label.to_string(),
            command_line: command_line.to_string(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn make_app() -> App {
        App::new(
            vec![entry("build", "make -j4")],
            DisplaySettings::default(),
            100,
        )
    }

    #[test]
    fn begin_start_requires_an_idle_row() {
        let mut app = make_app();
        let id = app.rows[0].id;
        assert!(app.begin_start(id).is_some());
        assert_eq!(app.rows[0].status, CommandStatus::Starting);
        assert!(app.begin_start(id).is_none());
        app.on_command_started(id, 42);
        assert!(app.begin_start(id).is_none());
    }

    #[test]
    fn begin_start_clears_the_output_pane() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.push_notice("stale");
        assert!(!app.log.is_empty());
        app.begin_start(id);
        assert!(app.log.is_empty());
    }

    #[test]
    fn natural_exit_resets_the_row() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.begin_start(id);
        app.on_command_started(id, 42);
        assert_eq!(app.rows[0].pid, Some(42));
        app.on_command_exited(id, Some(1));
        assert_eq!(app.rows[0].status, CommandStatus::Idle);
        assert_eq!(app.rows[0].pid, None);
        assert_eq!(app.rows[0].last_exit, Some(1));
        assert!(app.begin_start(id).is_some());
    }

    #[test]
    fn kill_resets_the_row_and_posts_a_notice() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.begin_start(id);
        app.on_command_started(id, 42);
        app.on_command_killed(id);
        assert_eq!(app.rows[0].status, CommandStatus::Idle);
        assert_eq!(app.rows[0].pid, None);
        let last = app.log.iter().last().unwrap();
        assert_eq!(last.text, "Command 'build' terminated by user.");
        assert_eq!(last.stream, StreamKind::Notice);
    }

    #[test]
    fn spawn_failure_logs_a_single_error_line() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.begin_start(id);
        app.on_command_failed(id, "no such file");
        assert_eq!(app.rows[0].status, CommandStatus::Idle);
        assert_eq!(app.log.len(), 1);
        assert_eq!(app.log.iter().next().unwrap().text, "Error: no such file");
    }

    #[test]
    fn create_flow_appends_a_row() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.input_mode, InputMode::NewLabel);
        type_text(&mut app, "web");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "npm run dev");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            AppAction::AppendEntry(entry("web", "npm run dev"))
        );
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn empty_label_is_rejected_without_state_change() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('n')));
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::None);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.log.iter().next().unwrap().text, "Label must not be empty");
    }

    #[test]
    fn empty_command_edit_is_rejected() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('e')));
        app.input.clear();
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::None);
        assert_eq!(app.rows[0].entry.command_line, "make -j4");
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('n')));
        type_text(&mut app, "build");
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "cargo build");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::None);
        assert_eq!(app.rows.len(), 1);
    }

    #[test]
    fn editing_persists_through_save_entries() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('e')));
        assert_eq!(app.input, "make -j4");
        app.input.clear();
        type_text(&mut app, "make check");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::SaveEntries);
        assert_eq!(app.rows[0].entry.command_line, "make check");
    }

    #[test]
    fn sudo_command_prompts_for_a_password() {
        let mut app = App::new(
            vec![entry("restart", "sudo systemctl restart nginx")],
            DisplaySettings::default(),
            100,
        );
        let id = app.rows[0].id;
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::None);
        assert_eq!(app.input_mode, InputMode::Password { id });
        type_text(&mut app, "hunter two");
        assert_eq!(app.prompt_line().unwrap(), "Sudo password: **********");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            AppAction::Start {
                id,
                password: Some("hunter two".to_string())
            }
        );
    }

    #[test]
    fn plain_command_starts_without_a_prompt() {
        let mut app = make_app();
        let id = app.rows[0].id;
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::Start { id, password: None });
    }

    #[test]
    fn settings_flow_updates_and_saves() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.input, "20");
        app.input.clear();
        type_text(&mut app, "30");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.input, "100");
        app.input.clear();
        type_text(&mut app, "120");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::SaveSettings);
        assert_eq!(app.settings, DisplaySettings { height: 30, width: 120 });
    }

    #[test]
    fn malformed_settings_input_changes_nothing() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('o')));
        app.input.clear();
        type_text(&mut app, "tall");
        app.handle_key(key(KeyCode::Enter));
        app.input.clear();
        type_text(&mut app, "120");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, AppAction::None);
        assert_eq!(app.settings, DisplaySettings::default());
        assert_eq!(
            app.log.iter().next().unwrap().text,
            "Invalid input for height or width. Please enter valid integers."
        );
    }

    #[test]
    fn remove_row_adjusts_the_selection() {
        let mut app = App::new(
            vec![entry("a", "true"), entry("b", "true")],
            DisplaySettings::default(),
            100,
        );
        app.selected = 1;
        let id = app.rows[1].id;
        app.remove_row(id);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn stale_events_for_removed_rows_are_ignored() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.remove_row(id);
        app.on_command_killed(id);
        app.on_command_exited(id, Some(0));
        app.on_command_output(id, "late line", StreamKind::Stdout);
        assert!(app
            .log
            .iter()
            .all(|line| line.stream == StreamKind::Notice));
    }

    #[test]
    fn stderr_block_is_split_into_lines() {
        let mut app = make_app();
        let id = app.rows[0].id;
        app.on_command_output(id, "bad\nworse", StreamKind::Stderr);
        let lines: Vec<&str> = app.log.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(lines, vec!["bad", "worse"]);
    }
}
