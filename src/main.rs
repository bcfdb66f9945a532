//! cmdboard: start, stop, and watch a board of named shell commands.
//!
//! This is the entry point of the application. It parses command-line
//! arguments, loads the commands and settings files, and runs the main event
//! loop that connects user input, the process runner, and the TUI.

mod app;
mod events;
mod output;
mod process;
mod runner;
mod settings;
mod store;
mod tui;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::styling::{AnsiColor, Effects, Style};
use clap::builder::Styles;
use clap::Parser;
use tokio::sync::mpsc;

use crate::app::{App, AppAction};
use crate::events::Event;
use crate::runner::CommandRunner;
use crate::tui::TuiTerminal;

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "cmdboard",
    version,
    about = "Start, stop, and watch a board of named shell commands",
    styles = help_styles(),
    color = clap::ColorChoice::Always
)]
struct Cli {
    /// Path to the commands file.
    #[arg(long, default_value = "commands.txt")]
    commands: PathBuf,
    /// Path to the display settings file.
    #[arg(long, default_value = "config.txt")]
    settings: PathBuf,
    /// Max lines kept in the output pane.
    #[arg(long, default_value_t = 10_000)]
    max_lines: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if !cli.commands.exists() {
        eprintln!(
            "commands file {} not found, starting with an empty board",
            cli.commands.display()
        );
    }
    let entries = store::load(&cli.commands)?;
    let display = settings::load(&cli.settings);

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let mut runner = CommandRunner::new(event_tx.clone());
    let mut app = App::new(entries, display, cli.max_lines);

    let mut terminal = tui::init_terminal()?;
    spawn_input_listener(event_tx.clone());
    spawn_signal_listener(event_tx.clone());

    let mut ticker = tokio::time::interval(Duration::from_millis(150));
    let mut result = Ok(());
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                handle_event(event, &mut app, &mut runner, &mut terminal, &cli).await;
            }
            _ = ticker.tick() => {
                runner.poll_exits().await;
            }
        }

        if let Err(err) = tui::draw(&mut app, &mut terminal) {
            result = Err(err.into());
            break;
        }
        if app.should_quit {
            break;
        }
    }

    runner.stop_all().await;
    tui::restore_terminal(terminal)?;
    result
}

async fn handle_event(
    event: Event,
    app: &mut App,
    runner: &mut CommandRunner,
    terminal: &mut TuiTerminal,
    cli: &Cli,
) {
    match event {
        Event::CommandStarted { id, pid } => app.on_command_started(id, pid),
        Event::CommandOutput { id, text, stream } => app.on_command_output(id, &text, stream),
        Event::CommandExited { id, code } => app.on_command_exited(id, code),
        Event::CommandFailed { id, error } => app.on_command_failed(id, &error),
        Event::CommandKilled { id } => app.on_command_killed(id),
        Event::Key(key) => {
            let action = app.handle_key(key);
            run_action(action, app, runner, cli).await;
        }
        Event::Mouse(mouse) => app.handle_mouse(mouse),
        Event::Resize { .. } => {
            let _ = terminal.autoresize();
        }
        Event::Shutdown => {
            runner.stop_all().await;
            app.should_quit = true;
        }
    }
}

async fn run_action(action: AppAction, app: &mut App, runner: &mut CommandRunner, cli: &Cli) {
    match action {
        AppAction::None => {}
        AppAction::Quit => {
            runner.stop_all().await;
            app.should_quit = true;
        }
        AppAction::Start { id, password } => {
            let Some(line) = app.begin_start(id) else {
                return;
            };
            if let Err(err) = runner.start(id, &line, password.as_deref()).await {
                app.on_command_failed(id, &err.to_string());
            }
        }
        AppAction::Stop(id) => runner.stop(id).await,
        AppAction::Delete(id) => {
            runner.stop(id).await;
            app.remove_row(id);
            if let Err(err) = store::save(&cli.commands, &app.entries()) {
                app.push_notice(format!("Error: {}", err));
            }
        }
        AppAction::AppendEntry(entry) => {
            if let Err(err) = store::append(&cli.commands, &entry) {
                app.push_notice(format!("Error: {}", err));
            }
        }
        AppAction::SaveEntries => {
            if let Err(err) = store::save(&cli.commands, &app.entries()) {
                app.push_notice(format!("Error: {}", err));
            }
        }
        AppAction::Reload => {
            for id in app.running_ids() {
                runner.stop(id).await;
            }
            if !cli.commands.exists() {
                app.push_notice(format!("commands file {} not found", cli.commands.display()));
            }
            match store::load(&cli.commands) {
                Ok(entries) => app.replace_rows(entries),
                Err(err) => app.push_notice(format!("Error: {}", err)),
            }
        }
        AppAction::SaveSettings => {
            if let Err(err) = settings::save(&cli.settings, app.settings) {
                app.push_notice(format!("Error: {}", err));
            }
        }
        AppAction::CopyLog => match app.log_text() {
            Some(text) => match copy_to_clipboard(&text) {
                Ok(()) => app.set_status_message("copied output to clipboard"),
                Err(err) => app.set_status_message(format!("clipboard failed: {}", err)),
            },
            None => app.set_status_message("nothing to copy"),
        },
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("failed to access clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("failed to set clipboard text")?;
    Ok(())
}

fn spawn_input_listener(tx: mpsc::Sender<Event>) {
    std::thread::spawn(move || loop {
        if crossterm::event::poll(Duration::from_millis(100)).unwrap_or(false) {
            match crossterm::event::read() {
                Ok(crossterm::event::Event::Key(key)) => {
                    let _ = tx.blocking_send(Event::Key(key));
                }
                Ok(crossterm::event::Event::Mouse(mouse)) => {
                    let _ = tx.blocking_send(Event::Mouse(mouse));
                }
                Ok(crossterm::event::Event::Resize(width, height)) => {
                    let _ = tx.blocking_send(Event::Resize { width, height });
                }
                _ => {}
            }
        }
    });
}

fn spawn_signal_listener(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(_) => return,
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    let _ = tx.send(Event::Shutdown).await;
                }
                _ = sigterm.recv() => {
                    let _ = tx.send(Event::Shutdown).await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            let _ = tx.send(Event::Shutdown).await;
        }
    });
}

fn help_styles() -> Styles {
    Styles::styled()
        .header(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .usage(
            Style::new()
                .fg_color(Some(AnsiColor::Green.into()))
                .effects(Effects::BOLD),
        )
        .literal(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::Magenta.into())))
}
