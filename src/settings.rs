//! The display settings file.
//!
//! Two lines of text: the output pane height in rows, then its width in
//! columns. Anything the file cannot provide falls back to the defaults.
//! Zero or negative values are accepted here and clamped only at render time.

use std::path::Path;

use anyhow::{Context, Result};

pub const DEFAULT_HEIGHT: i64 = 20;
pub const DEFAULT_WIDTH: i64 = 100;

/// Size of the shared output pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Pane height in terminal rows.
    pub height: i64,
    /// Pane width in terminal columns.
    pub width: i64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
        }
    }
}

/// Loads settings, falling back to defaults for a missing or malformed file.
///
/// A line that fails to parse as an integer discards the whole file; a file
/// with fewer than two lines defaults only the missing values.
pub fn load(path: &Path) -> DisplaySettings {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return DisplaySettings::default();
    };
    let mut lines = raw.lines();
    let height = match lines.next() {
        Some(line) => match line.trim().parse() {
            Ok(value) => value,
            Err(_) => return DisplaySettings::default(),
        },
        None => DEFAULT_HEIGHT,
    };
    let width = match lines.next() {
        Some(line) => match line.trim().parse() {
            Ok(value) => value,
            Err(_) => return DisplaySettings::default(),
        },
        None => DEFAULT_WIDTH,
    };
    DisplaySettings { height, width }
}

/// Overwrites the settings file with the two integers, one per line.
pub fn save(path: &Path, settings: DisplaySettings) -> Result<()> {
    std::fs::write(path, format!("{}\n{}\n", settings.height, settings.width))
        .with_context(|| format!("failed to write settings file {}", path.display()))
}
