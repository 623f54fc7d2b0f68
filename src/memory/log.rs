use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{MemoryError, MemoryHistory, MemoryRecord};

/// Handle to the append-only memory file.
///
/// All file I/O runs on `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct MemoryLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl MemoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line. Creates the file and its parent
    /// directory on first use.
    pub async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| MemoryError::Task(format!("append join: {e}")))??;

        debug!(path = %self.path.display(), who = %record.who, "memory record appended");
        Ok(())
    }

    /// Read every record in append order. A missing file is an empty history.
    pub async fn read_all(&self) -> Result<MemoryHistory, MemoryError> {
        let path = self.path.clone();
        let history = tokio::task::spawn_blocking(move || read_history(&path))
            .await
            .map_err(|e| MemoryError::Task(format!("read_all join: {e}")))??;

        if history.skipped > 0 {
            warn!(
                path = %self.path.display(),
                skipped = history.skipped,
                "memory log contains malformed lines"
            );
        }
        Ok(history)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> MemoryError {
    MemoryError::Io { path: path.display().to_string(), source }
}

fn append_line(path: &Path, line: &str) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    file.write_all(line.as_bytes()).map_err(|e| io_error(path, e))
}

fn read_history(path: &Path) -> Result<MemoryHistory, MemoryError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MemoryHistory::default()),
        Err(e) => return Err(io_error(path, e)),
    };

    // Split on raw bytes: a line with invalid UTF-8 is one malformed record.
    let mut history = MemoryHistory::default();
    for (idx, line) in bytes.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<MemoryRecord>(line) {
            Ok(record) => history.records.push(record),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping malformed memory line");
                history.skipped += 1;
            }
        }
    }
    Ok(history)
}
