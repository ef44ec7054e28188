use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use pressmon_traits::SessionLog;

/// Timestamp prefix of every session log line.
pub const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only session log: one `[YYYY-MM-DD HH:MM:SS] message` line per call.
pub struct FileSessionLog {
    path: PathBuf,
    file: File,
}

impl FileSessionLog {
    /// Open (or create) `path` for appending. Parent directories are created.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn format_line(message: &str) -> String {
    let ts = chrono::Local::now().format(LINE_TIME_FORMAT);
    format!("[{ts}] {message}")
}

impl SessionLog for FileSessionLog {
    fn append(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        writeln!(self.file, "{}", format_line(line))?;
        self.file.flush()?;
        Ok(())
    }
}

/// Discards everything. For runs without a session directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSessionLog;

impl SessionLog for NullSessionLog {
    fn append(&mut self, _line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
