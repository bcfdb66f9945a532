//! Data structures for command rows.
//!
//! Each configured command occupies one row on the board. Rows are identified
//! by a `RowId` that stays stable for the whole session and is never reused,
//! so events coming back from worker tasks always refer to the row they were
//! spawned for, even across edits, deletes, and reloads.

/// Session-stable identifier for a command row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub u64);

/// A named shell command as stored in the commands file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    /// User-visible unique name.
    pub label: String,
    /// Shell text executed on start.
    pub command_line: String,
}

/// The current lifecycle status of a command row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// No child process exists for this row.
    Idle,
    /// Start was issued; the spawn has not reported a PID yet.
    Starting,
    /// A child process is alive.
    Running,
}

/// Runtime state of a single command row.
#[derive(Debug, Clone)]
pub struct CommandRow {
    /// Stable identifier used by events and the runner.
    pub id: RowId,
    /// The persisted label and command line.
    pub entry: CommandEntry,
    /// Current execution status.
    pub status: CommandStatus,
    /// PID of the live child, if any.
    pub pid: Option<u32>,
    /// Exit code of the most recent run.
    pub last_exit: Option<i32>,
    /// Free-text arguments appended to the command line at start time.
    pub extra_args: String,
}

impl CommandRow {
    /// Creates an idle row from a persisted entry.
    pub fn new(id: RowId, entry: CommandEntry) -> Self {
        Self {
            id,
            entry,
            status: CommandStatus::Idle,
            pid: None,
            last_exit: None,
            extra_args: String::new(),
        }
    }

    /// The command line with any extra arguments appended.
    pub fn composed_command_line(&self) -> String {
        let extra = self.extra_args.trim();
        if extra.is_empty() {
            self.entry.command_line.clone()
        } else {
            format!("{} {}", self.entry.command_line, extra)
        }
    }
}
