//! JSON-lines persistence for specs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::Spec;
use crate::errors::OutputError;

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl JsonLinesWriter {
    /// Opens `path` for appending, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Writes one record and flushes it.
    pub fn write_spec(&mut self, spec: &Spec) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.writer, spec)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Records written through this writer.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
