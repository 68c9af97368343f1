use std::{
    fs::{OpenOptions, create_dir_all},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;

/// Append-only, day-bucketed operational log: one `callback_YYYY-MM-DD.log`
/// file per day, one `[timestamp] message` line per event. Lines are
/// advisory and never read back by request handling; the diagnostics page
/// shows a tail of the current day for operators.
#[derive(Debug, Clone)]
pub(crate) struct EventLog {
    dir: PathBuf,
}

impl EventLog {
    pub(crate) fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn current_log_path(&self) -> PathBuf {
        self.dir
            .join(format!("callback_{}.log", Utc::now().format("%Y-%m-%d")))
    }

    /// A log write failure must never fail the request that produced it.
    pub(crate) fn log(&self, message: &str) {
        if let Err(err) = self.append(message) {
            eprintln!("callback event log write failed: {err}");
        }
    }

    pub(crate) fn ensure_dir(&self) -> Result<(), String> {
        create_dir_all(&self.dir).map_err(|err| format!("creating log directory failed: {err}"))
    }

    fn append(&self, message: &str) -> Result<(), String> {
        self.ensure_dir()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_log_path())
            .map_err(|err| format!("opening log file failed: {err}"))?;
        writeln!(
            file,
            "[{}] {message}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )
        .map_err(|err| format!("appending log file failed: {err}"))?;
        Ok(())
    }

    /// Last `limit` lines of the current day's log; empty when the file
    /// does not exist or cannot be read.
    pub(crate) fn tail_current(&self, limit: usize) -> Vec<String> {
        let Ok(file) = OpenOptions::new().read(true).open(self.current_log_path()) else {
            return Vec::new();
        };
        let reader = BufReader::new(file);
        let mut lines: Vec<String> = reader.lines().map_while(Result::ok).collect();
        let skip = lines.len().saturating_sub(limit);
        lines.drain(..skip);
        lines
    }
}
