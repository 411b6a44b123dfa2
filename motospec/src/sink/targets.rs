//! Log targets the error sink routes into.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::errors::{ErrorKind, ScrapeError};

/// A destination for routed errors.
///
/// Called from the sink's blocking thread, so implementations may do
/// synchronous IO. Failures to record are the target's own business and
/// must not panic.
pub trait ErrorLog: Send + Sync {
    /// Records one error.
    fn record(&self, kind: ErrorKind, error: &ScrapeError);
}

/// Forwards errors to `tracing`.
///
/// Transport errors are logged at `warn`, processing errors at `error`.
#[derive(Debug, Clone)]
pub struct TracingErrorLog {
    target: String,
}

impl TracingErrorLog {
    /// Creates a log tagged with `target` (e.g. "client", "processor").
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }
}

impl ErrorLog for TracingErrorLog {
    fn record(&self, kind: ErrorKind, err: &ScrapeError) {
        if kind.is_transport() {
            warn!(log = %self.target, %kind, "{}", err);
        } else {
            error!(log = %self.target, %kind, "{}", err);
        }
    }
}

/// Appends one timestamped line per error to a file.
pub struct FileErrorLog {
    path: PathBuf,
    prefix: &'static str,
    file: Mutex<File>,
}

impl FileErrorLog {
    /// Opens (or creates) `path` for appending, prefixing lines with `prefix`.
    pub fn open(path: impl AsRef<Path>, prefix: &'static str) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            prefix,
            file: Mutex::new(file),
        })
    }

    /// Log for fetch-layer errors.
    pub fn client(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::open(path, "Client error:")
    }

    /// Log for stage errors.
    pub fn processor(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::open(path, "Processor error:")
    }

    /// Path being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorLog for FileErrorLog {
    fn record(&self, kind: ErrorKind, err: &ScrapeError) {
        let line = format!(
            "{} {} [{}] {}\n",
            Utc::now().format("%Y/%m/%d %H:%M:%S"),
            self.prefix,
            kind,
            err
        );
        let mut file = self.file.lock();
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|()| file.flush()) {
            warn!(path = %self.path.display(), "cannot write error log: {}", e);
        }
    }
}

impl std::fmt::Debug for FileErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileErrorLog")
            .field("path", &self.path)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Keeps every error in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingErrorLog {
    records: RwLock<Vec<(ErrorKind, ScrapeError)>>,
}

impl CollectingErrorLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded errors, in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<(ErrorKind, ScrapeError)> {
        self.records.read().clone()
    }

    /// Errors of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: ErrorKind) -> Vec<ScrapeError> {
        self.records
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ErrorLog for CollectingErrorLog {
    fn record(&self, kind: ErrorKind, err: &ScrapeError) {
        self.records.write().push((kind, err.clone()));
    }
}
