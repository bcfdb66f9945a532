//! Terminal setup and rendering.
//!
//! This module handles initializing the terminal in raw mode, restoring it on
//! exit, and drawing the command board with `ratatui`: one row per command on
//! top, the shared output pane below it, and a two-line status bar at the
//! bottom.

use std::io::{self, Stdout};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph};
use ratatui::Terminal;

use crate::app::App;
use crate::output::{sanitize_text, StreamKind};
use crate::process::{CommandRow, CommandStatus};

/// Type alias for the specific terminal backend used.
pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Initializes the terminal for TUI mode.
pub fn init_terminal() -> io::Result<TuiTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restores the terminal to its original state.
pub fn restore_terminal(mut terminal: TuiTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Draws the current application state to the terminal.
pub fn draw(app: &mut App, terminal: &mut TuiTerminal) -> io::Result<()> {
    let title = window_title(app);
    execute!(terminal.backend_mut(), SetTitle(title))?;
    terminal.draw(|frame| {
        let area = frame.size();
        let pane_height = clamp_dimension(app.settings.height).saturating_add(2);
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(pane_height),
                Constraint::Length(4),
            ])
            .split(area);

        draw_command_list(app, frame, vertical[0]);
        draw_output_pane(app, frame, vertical[1]);
        draw_status_bar(app, frame, vertical[2]);

        if app.show_help {
            draw_help_overlay(frame, area);
        }
    })?;
    Ok(())
}

fn draw_command_list(app: &App, frame: &mut ratatui::Frame, area: Rect) {
    let border_style = Style::default().fg(Color::DarkGray);
    let width = area.width as usize;
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| command_list_item(row, index == app.selected, width))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .title("Commands")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style),
    );
    frame.render_stateful_widget(list, area, &mut list_state(app.selected, app.rows.len()));
}

fn command_list_item(row: &CommandRow, is_selected: bool, width: usize) -> ListItem<'static> {
    let marker = if is_selected { "▶ " } else { "  " };
    let pid = row
        .pid
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".into());
    let name_style = if is_selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut preview = row.entry.command_line.clone();
    if !row.extra_args.trim().is_empty() {
        preview.push_str(&format!(" +[{}]", row.extra_args.trim()));
    }
    let detail = format!("  PID: {}  › {}", pid, preview);
    let detail = truncate(&detail, width.saturating_sub(24));
    ListItem::new(Line::from(vec![
        Span::styled(
            marker.to_string(),
            if is_selected {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            },
        ),
        Span::styled(
            format!("[{}] ", status_char(row.status)),
            status_style(row),
        ),
        Span::styled(format!("{:<20}", row.entry.label.clone()), name_style),
        Span::styled(detail, Style::default().fg(Color::DarkGray)),
    ]))
}

fn draw_output_pane(app: &mut App, frame: &mut ratatui::Frame, area: Rect) {
    let pane_width = clamp_dimension(app.settings.width).saturating_add(2);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pane_width), Constraint::Min(0)])
        .split(area);
    let pane = horizontal[0];

    let block = Block::default()
        .title("Output")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(pane);
    let height = inner.height as usize;
    let width = inner.width as usize;
    app.log_view_height = height;

    let total = app.log.len();
    let start = if app.follow {
        total.saturating_sub(height)
    } else {
        app.log_scroll.min(total.saturating_sub(height))
    };
    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(start)
        .take(height)
        .map(|line| {
            let text = truncate(
                &strip_carriage(&sanitize_text(&line.text)),
                width.saturating_sub(1),
            );
            Line::from(Span::styled(text, stream_style(line.stream)))
        })
        .collect();
    let paragraph = Paragraph::new(Text::from(lines)).block(block);
    frame.render_widget(paragraph, pane);

    if total == 0 {
        let empty = Paragraph::new("No output yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    }
}

fn draw_status_bar(app: &App, frame: &mut ratatui::Frame, area: Rect) {
    let default_help = "↑/↓ select | Enter start | k stop | n new | e edit | a args | d delete | r reload | o settings | y copy | f follow | q quit | ? help";
    let help_line = match app.prompt_line() {
        Some(prompt) => format!("{} (Enter to confirm, Esc to cancel)", prompt),
        None => app
            .status_message()
            .map(str::to_string)
            .unwrap_or_else(|| default_help.to_string()),
    };
    let status = Paragraph::new(Text::from(vec![
        Line::from(Span::raw(app.status_line())),
        Line::from(Span::styled(
            help_line,
            Style::default().fg(Color::DarkGray),
        )),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(status, area);
}

fn draw_help_overlay(frame: &mut ratatui::Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    let help_text = vec![
        "Navigation:",
        "  Up/Down    Select command",
        "  Tab        Cycle selection",
        "  PageUp/Dn  Scroll output",
        "  Home/End   Scroll to top/bottom",
        "",
        "Commands:",
        "  Enter/s    Start selected",
        "  k          Stop selected (kills the process group)",
        "  a          Set extra arguments for the next start",
        "  n          New command",
        "  e          Edit command line",
        "  d          Delete (stops it first)",
        "  r          Reload the commands file",
        "",
        "Output & settings:",
        "  f          Toggle auto-follow",
        "  y          Copy output to clipboard",
        "  o          Output pane size",
        "",
        "General:",
        "  ?          Toggle this help",
        "  q          Quit",
    ]
    .join("\n");

    let help_block = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, popup_area);
    frame.render_widget(help_block, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn window_title(app: &App) -> String {
    if let Some(row) = app.selected_row() {
        format!("cmdboard · {}", row.entry.label)
    } else {
        "cmdboard".to_string()
    }
}

fn list_state(selected: usize, len: usize) -> ratatui::widgets::ListState {
    let mut state = ratatui::widgets::ListState::default();
    if len > 0 {
        state.select(Some(selected.min(len - 1)));
    }
    state
}

// Settings values come straight from a text file; anything unusable as a
// terminal dimension renders as zero and the layout clamps the rest.
fn clamp_dimension(value: i64) -> u16 {
    value.clamp(0, u16::MAX as i64) as u16
}

fn status_char(status: CommandStatus) -> char {
    match status {
        CommandStatus::Idle => '·',
        CommandStatus::Starting => '↻',
        CommandStatus::Running => '▲',
    }
}

fn status_style(row: &CommandRow) -> Style {
    match row.status {
        CommandStatus::Idle => {
            if row.last_exit.map(|code| code != 0).unwrap_or(false) {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        }
        CommandStatus::Starting => Style::default().fg(Color::Yellow),
        CommandStatus::Running => Style::default().fg(Color::Green),
    }
}

fn stream_style(stream: StreamKind) -> Style {
    match stream {
        StreamKind::Stdout => Style::default(),
        StreamKind::Stderr => Style::default().fg(Color::Red),
        StreamKind::Notice => Style::default().fg(Color::Yellow),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = text.chars().take(max.saturating_sub(1)).collect::<String>();
    out.push('~');
    out
}

fn strip_carriage(text: &str) -> String {
    text.rsplit('\r').next().unwrap_or("").to_string()
}
