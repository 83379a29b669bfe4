//! Append-only remote-log sink.
//!
//! Two known source tags (`"scanai"`, `"posai"`) each get their own
//! append-only file under the configured log directory. Writes for an
//! unknown source are discarded with a warning rather than rejected with an
//! error, per the wire contract.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write as _},
    path::Path,
    sync::Mutex,
};

use tracing::warn;

const KNOWN_SOURCES: [&str; 2] = ["scanai", "posai"];

/// One accepted log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity label, e.g. `"info"`, `"error"`.
    pub level: String,
    /// Free-form message text.
    pub message: String,
    /// Client-supplied ISO-8601 timestamp.
    pub timestamp: String,
}

struct SourceFile {
    tag: &'static str,
    file: Mutex<File>,
}

/// The append-only sink shared by all remote-log requests.
pub struct LogSink {
    files: Vec<SourceFile>,
}

impl LogSink {
    /// Open (creating if absent) one append-only file per known source tag
    /// under `log_dir`.
    ///
    /// # Errors
    /// Returns any I/O error opening a source file.
    pub fn open(log_dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        let mut files = Vec::with_capacity(KNOWN_SOURCES.len());
        for tag in KNOWN_SOURCES {
            let path = log_dir.join(format!("{tag}.log"));
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            files.push(SourceFile {
                tag,
                file: Mutex::new(file),
            });
        }
        Ok(Self { files })
    }

    /// Append `entries` for `source`, then flush and fsync once for the batch.
    ///
    /// Unknown sources are discarded with a warning and reported as success,
    /// matching the "silent rejection" policy — the caller never learns
    /// which sources are recognized.
    ///
    /// # Errors
    /// Returns any I/O error writing or flushing a known source's file.
    pub fn write_batch(&self, source: &str, entries: &[LogEntry]) -> io::Result<()> {
        let Some(source_file) = self.files.iter().find(|candidate| candidate.tag == source) else {
            warn!(source, "discarding remote-log batch for unknown source");
            return Ok(());
        };

        let Ok(mut file) = source_file.file.lock() else {
            warn!(source, "log sink mutex poisoned, dropping batch");
            return Ok(());
        };

        for entry in entries {
            writeln!(file, "[{}] [{}] {}", entry.timestamp, entry.level, entry.message)?;
        }
        file.flush()?;
        file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::tempdir;

    use super::*;

    fn entry() -> LogEntry {
        LogEntry {
            level: "info".to_owned(),
            message: "frame accepted".to_owned(),
            timestamp: "2026-07-28T00:00:00Z".to_owned(),
        }
    }

    #[rstest]
    fn writes_known_source_and_persists_content() {
        let dir = tempdir().expect("tempdir");
        let sink = LogSink::open(dir.path()).expect("open sink");

        sink.write_batch("scanai", &[entry()]).expect("write batch");

        let content = std::fs::read_to_string(dir.path().join("scanai.log")).expect("read file");
        assert!(content.contains("frame accepted"));
        assert!(content.contains("[info]"));
    }

    #[rstest]
    fn discards_unknown_source_without_error() {
        let dir = tempdir().expect("tempdir");
        let sink = LogSink::open(dir.path()).expect("open sink");

        let result = sink.write_batch("unknown-source", &[entry()]);

        assert!(result.is_ok());
        assert!(!dir.path().join("unknown-source.log").exists());
    }
}
