//! Child process lifecycle.
//!
//! `CommandRunner` owns at most one child per command row. It spawns through
//! a shell so pipes and redirection in command text work, places each child
//! in its own process group on Unix, streams stdout line by line, and flushes
//! buffered stderr as one block when the stream closes at exit. Everything it
//! learns is posted to the event channel; it never touches UI state.

use std::collections::HashMap;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::events::Event;
use crate::output::StreamKind;
use crate::process::RowId;

/// Spawns, tracks, and terminates one child process per command row.
pub struct CommandRunner {
    children: HashMap<RowId, RunningCommand>,
    event_tx: mpsc::Sender<Event>,
}

struct RunningCommand {
    child: Child,
    pid: u32,
}

impl CommandRunner {
    /// Creates a runner that reports through the given event channel.
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            children: HashMap::new(),
            event_tx,
        }
    }

    /// Spawns the command line for a row.
    ///
    /// A start while a child exists for the row is a no-op; the UI already
    /// refuses it, this guard keeps the one-child-per-row invariant even if a
    /// caller slips. The PID is reported immediately after the spawn.
    pub async fn start(
        &mut self,
        id: RowId,
        command_line: &str,
        password: Option<&str>,
    ) -> Result<()> {
        if self.children.contains_key(&id) {
            return Ok(());
        }
        let line = effective_command_line(command_line, password);
        let mut command = shell_command(&line);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command.kill_on_drop(true);

        // Own process group so the whole pipeline can be signaled at once.
        #[cfg(unix)]
        unsafe {
            command.pre_exec(|| {
                let _ = libc::setpgid(0, 0);
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", command_line))?;
        let pid = child.id().unwrap_or(0);
        let _ = self.event_tx.send(Event::CommandStarted { id, pid }).await;

        if let Some(stdout) = child.stdout.take() {
            let tx = self.event_tx.clone();
            tokio::spawn(stream_stdout(id, stdout, tx));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = self.event_tx.clone();
            tokio::spawn(drain_stderr(id, stderr, tx));
        }

        self.children.insert(id, RunningCommand { child, pid });
        Ok(())
    }

    /// Force-terminates the child for a row.
    ///
    /// No-op when nothing is running. When a non-blocking poll shows the
    /// child already exited, the normal exit path runs instead of the kill.
    /// The record is cleared without waiting for the OS to confirm death; the
    /// dropped handle is reaped by the runtime.
    pub async fn stop(&mut self, id: RowId) {
        let Some(mut running) = self.children.remove(&id) else {
            return;
        };
        match running.child.try_wait() {
            Ok(Some(status)) => {
                let _ = self
                    .event_tx
                    .send(Event::CommandExited {
                        id,
                        code: status.code(),
                    })
                    .await;
            }
            _ => {
                kill_hard(&mut running.child, running.pid);
                let _ = self.event_tx.send(Event::CommandKilled { id }).await;
            }
        }
    }

    /// Reaps children that exited on their own; called on the UI loop tick.
    pub async fn poll_exits(&mut self) {
        let mut finished = Vec::new();
        for (id, running) in self.children.iter_mut() {
            match running.child.try_wait() {
                Ok(Some(status)) => finished.push((*id, Ok(status.code()))),
                Ok(None) => {}
                Err(err) => finished.push((*id, Err(err.to_string()))),
            }
        }
        for (id, outcome) in finished {
            self.children.remove(&id);
            let event = match outcome {
                Ok(code) => Event::CommandExited { id, code },
                Err(error) => Event::CommandFailed { id, error },
            };
            let _ = self.event_tx.send(event).await;
        }
    }

    /// Stops every tracked child; used on quit so nothing outlives the UI.
    pub async fn stop_all(&mut self) {
        let ids: Vec<RowId> = self.children.keys().copied().collect();
        for id in ids {
            self.stop(id).await;
        }
    }
}

/// Builds the line actually handed to the shell.
///
/// A command mentioning `sudo` gets the captured password piped into
/// `sudo -S`, with the password quoted so embedded spaces or quotes survive
/// the shell. An empty or absent password leaves the line untouched.
pub fn effective_command_line(command_line: &str, password: Option<&str>) -> String {
    let trimmed = command_line.trim();
    match password {
        Some(password) if !password.is_empty() && wants_password(trimmed) => {
            let rest = trimmed
                .strip_prefix("sudo")
                .map(str::trim_start)
                .unwrap_or(trimmed);
            format!("echo {} | sudo -S {}", shell_words::quote(password), rest)
        }
        _ => trimmed.to_string(),
    }
}

/// True when starting this line should prompt for a sudo password.
pub fn wants_password(command_line: &str) -> bool {
    command_line.contains("sudo")
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(not(unix))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

// Hard kill, group-wide on Unix. No grace period, no escalation.
#[cfg(unix)]
fn kill_hard(child: &mut Child, pid: u32) {
    if pid != 0 {
        unsafe {
            let _ = libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    let _ = child.start_kill();
}

#[cfg(not(unix))]
fn kill_hard(child: &mut Child, _pid: u32) {
    let _ = child.start_kill();
}

async fn stream_stdout(id: RowId, stdout: tokio::process::ChildStdout, tx: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let _ = tx
            .send(Event::CommandOutput {
                id,
                text: line,
                stream: StreamKind::Stdout,
            })
            .await;
    }
}

// Stderr is held back and delivered in one piece when the stream closes,
// which happens at process exit.
async fn drain_stderr(id: RowId, stderr: tokio::process::ChildStderr, tx: mpsc::Sender<Event>) {
    let mut buffer = Vec::new();
    if BufReader::new(stderr).read_to_end(&mut buffer).await.is_err() {
        return;
    }
    let text = String::from_utf8_lossy(&buffer);
    let text = text.trim_end_matches('\n');
    if !text.is_empty() {
        let _ = tx
            .send(Event::CommandOutput {
                id,
                text: text.to_string(),
                stream: StreamKind::Stderr,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sudo_line_pipes_the_escaped_password() {
        let line = effective_command_line("sudo ls", Some("p a'ss"));
        assert!(line.starts_with("echo "));
        assert!(line.ends_with("| sudo -S ls"));
        assert!(line.contains(shell_words::quote("p a'ss").as_ref()));
    }

    #[test]
    fn password_survives_shell_reparsing() {
        let line = effective_command_line("sudo ls", Some("two words"));
        let words = shell_words::split(&line).unwrap();
        assert_eq!(words[0], "echo");
        assert_eq!(words[1], "two words");
        assert_eq!(words[words.len() - 3..], ["sudo", "-S", "ls"]);
    }

    #[test]
    fn empty_password_runs_the_raw_line() {
        assert_eq!(effective_command_line("sudo ls", Some("")), "sudo ls");
        assert_eq!(effective_command_line("ls", None), "ls");
        assert_eq!(effective_command_line("ls", Some("pw")), "ls");
    }

    #[test]
    fn sudo_detection_is_substring_based() {
        assert!(wants_password("sudo systemctl restart nginx"));
        assert!(wants_password("make && sudo make install"));
        assert!(!wants_password("echo hello"));
    }

    #[tokio::test]
    async fn stop_without_a_child_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut runner = CommandRunner::new(tx);
        runner.stop(RowId(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn natural_exit_streams_output_and_clears_the_record() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = CommandRunner::new(tx);
        let id = RowId(7);
        runner
            .start(id, "printf 'one\\ntwo\\n'", None)
            .await
            .unwrap();
        assert!(runner.children.contains_key(&id));

        let mut started = false;
        let mut lines = Vec::new();
        let mut exit_code = None;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while (!started || exit_code.is_none() || lines.len() < 2)
            && tokio::time::Instant::now() < deadline
        {
            runner.poll_exits().await;
            match tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
                Ok(Some(Event::CommandStarted { pid, .. })) => {
                    assert_ne!(pid, 0);
                    started = true;
                }
                Ok(Some(Event::CommandOutput {
                    text,
                    stream: StreamKind::Stdout,
                    ..
                })) => lines.push(text),
                Ok(Some(Event::CommandExited { code, .. })) => exit_code = code,
                _ => {}
            }
        }
        assert!(started);
        assert_eq!(exit_code, Some(0));
        assert_eq!(lines, vec!["one", "two"]);
        assert!(!runner.children.contains_key(&id));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_its_exit_code() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = CommandRunner::new(tx);
        let id = RowId(3);
        runner.start(id, "false", None).await.unwrap();

        let mut exit_code = None;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while exit_code.is_none() && tokio::time::Instant::now() < deadline {
            runner.poll_exits().await;
            if let Ok(Some(Event::CommandExited { code, .. })) =
                tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                exit_code = code;
            }
        }
        assert_eq!(exit_code, Some(1));
        assert!(!runner.children.contains_key(&id));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stderr_arrives_as_one_block_after_exit() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = CommandRunner::new(tx);
        let id = RowId(4);
        runner
            .start(id, "printf 'bad\\nworse\\n' >&2", None)
            .await
            .unwrap();

        let mut block = None;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while block.is_none() && tokio::time::Instant::now() < deadline {
            runner.poll_exits().await;
            if let Ok(Some(Event::CommandOutput {
                text,
                stream: StreamKind::Stderr,
                ..
            })) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                block = Some(text);
            }
        }
        assert_eq!(block.as_deref(), Some("bad\nworse"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn second_start_is_a_no_op_and_stop_kills_the_group() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut runner = CommandRunner::new(tx);
        let id = RowId(9);
        runner.start(id, "sleep 30", None).await.unwrap();
        runner.start(id, "sleep 30", None).await.unwrap();

        let mut started_events = 0;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
        while tokio::time::Instant::now() < deadline {
            if let Ok(Some(Event::CommandStarted { .. })) =
                tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                started_events += 1;
            }
        }
        assert_eq!(started_events, 1);

        runner.stop(id).await;
        assert!(!runner.children.contains_key(&id));
        let mut killed = false;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !killed && tokio::time::Instant::now() < deadline {
            if let Ok(Some(Event::CommandKilled { .. })) =
                tokio::time::timeout(Duration::from_millis(50), rx.recv()).await
            {
                killed = true;
            }
        }
        assert!(killed);
    }
}
