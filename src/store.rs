//! The commands file.
//!
//! Flat text, one command per line. The first shell token is the label,
//! double-quoted when it contains whitespace; the rest of the line is the
//! command, written verbatim. Edits and deletes rewrite the whole file,
//! creating a command appends a single line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::process::CommandEntry;

/// Loads all entries, preserving file order.
///
/// A missing file yields an empty list. Lines that fail to tokenize, or that
/// tokenize to fewer than two words, are skipped.
pub fn load(path: &Path) -> Result<Vec<CommandEntry>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read commands file {}", path.display()))
        }
    };
    let mut entries = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(words) = shell_words::split(line) else {
            continue;
        };
        if words.len() < 2 {
            continue;
        }
        entries.push(CommandEntry {
            label: words[0].clone(),
            command_line: words[1..].join(" "),
        });
    }
    Ok(entries)
}

/// Rewrites the file from the given entries.
pub fn save(path: &Path, entries: &[CommandEntry]) -> Result<()> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format_line(entry));
        out.push('\n');
    }
    std::fs::write(path, out)
        .with_context(|| format!("failed to write commands file {}", path.display()))
}

/// Appends one entry without rewriting existing lines.
pub fn append(path: &Path, entry: &CommandEntry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open commands file {}", path.display()))?;
    writeln!(file, "{}", format_line(entry))
        .with_context(|| format!("failed to append to commands file {}", path.display()))?;
    Ok(())
}

fn format_line(entry: &CommandEntry) -> String {
    if entry.label.contains(char::is_whitespace) {
        format!("\"{}\" {}", entry.label, entry.command_line)
    } else {
        format!("{} {}", entry.label, entry.command_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn quoted_label_is_split_from_the_command() {
        let file = write_temp("\"Build Project\" make -j4\n");
        let entries = load(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "Build Project");
        assert_eq!(entries[0].command_line, "make -j4");
    }

    #[test]
    fn short_and_empty_lines_are_skipped() {
        let file = write_temp("\nonly-a-label\nweb npm run dev\n");
        let entries = load(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "web");
        assert_eq!(entries[0].command_line, "npm run dev");
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load(&dir.path().join("commands.txt")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn save_after_load_is_byte_equivalent() {
        let content = "\"Build Project\" make -j4\nweb npm run dev\n";
        let file = write_temp(content);
        let entries = load(file.path()).unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();
        save(out.path(), &entries).unwrap();
        assert_eq!(std::fs::read_to_string(out.path()).unwrap(), content);
    }

    #[test]
    fn labels_without_whitespace_are_not_quoted() {
        let out = tempfile::NamedTempFile::new().unwrap();
        let entries = vec![CommandEntry {
            label: "web".to_string(),
            command_line: "npm run dev".to_string(),
        }];
        save(out.path(), &entries).unwrap();
        assert_eq!(
            std::fs::read_to_string(out.path()).unwrap(),
            "web npm run dev\n"
        );
    }

    #[test]
    fn append_keeps_existing_lines_and_order() {
        let file = write_temp("web npm run dev\n");
        append(
            file.path(),
            &CommandEntry {
                label: "Log Tail".to_string(),
                command_line: "tail -f /var/log/syslog".to_string(),
            },
        )
        .unwrap();
        let entries = load(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "web");
        assert_eq!(entries[1].label, "Log Tail");
        assert_eq!(entries[1].command_line, "tail -f /var/log/syslog");
    }
}
