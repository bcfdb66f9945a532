//! Event definitions for the application event loop.
//!
//! Worker tasks never mutate UI state directly. Everything they learn about a
//! child process is posted here and applied by the event loop, which is the
//! sole mutator of application state.

use crossterm::event::{KeyEvent, MouseEvent};

use crate::output::StreamKind;
use crate::process::RowId;

/// Represents an event in the application's main event loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// A child process was spawned and has a PID.
    CommandStarted { id: RowId, pid: u32 },
    /// Child output: one stdout line, or the buffered stderr block at exit.
    CommandOutput {
        id: RowId,
        text: String,
        stream: StreamKind,
    },
    /// A child exited on its own (None usually implies signal termination).
    CommandExited { id: RowId, code: Option<i32> },
    /// Spawning or reading the child failed.
    CommandFailed { id: RowId, error: String },
    /// The user force-terminated the child.
    CommandKilled { id: RowId },
    /// A keyboard event received from the user.
    Key(KeyEvent),
    /// A mouse event received from the user.
    Mouse(MouseEvent),
    /// The terminal window was resized.
    Resize { width: u16, height: u16 },
    /// Ctrl-C or SIGTERM: stop every child and leave.
    Shutdown,
}
