//! JSONL plumbing between the worker and foreground listeners.
//!
//! The daemon appends one JSON record per line; listeners poll the file with
//! a byte offset so every poll returns only records appended since the last
//! one. Fire-and-forget: there is no delivery guarantee beyond the file.

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Appends records to a JSONL file, creating parent directories on demand.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Append one record as a single line.
    pub fn append(&self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string(record).wrap_err("failed to serialize record")?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .wrap_err_with(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{json}")
            .wrap_err_with(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

/// Reads new records from a JSONL file, tracking a byte offset across polls.
pub struct JsonlReader<T> {
    path: PathBuf,
    offset: u64,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            _marker: PhantomData,
        }
    }

    /// Resume from a previously persisted offset.
    pub fn with_offset(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
            _marker: PhantomData,
        }
    }

    /// Current byte offset, for persisting across restarts.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Return all records appended since the last poll.
    ///
    /// A missing file is an empty batch. Lines that fail to parse are
    /// skipped; a trailing partial line (writer mid-append) is left for the
    /// next poll.
    pub fn poll(&mut self) -> Result<Vec<T>> {
        let mut file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("failed to open {}", self.path.display()));
            }
        };

        file.seek(SeekFrom::Start(self.offset))
            .wrap_err_with(|| format!("failed to seek in {}", self.path.display()))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .wrap_err_with(|| format!("failed to read {}", self.path.display()))?;

        let mut records = Vec::new();
        let mut consumed = 0usize;
        for line in buf.split_inclusive('\n') {
            if !line.ends_with('\n') {
                break;
            }
            consumed += line.len();
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => eprintln!("[ipc] skipping unparseable line: {e}"),
            }
        }

        self.offset += consumed as u64;
        Ok(records)
    }
}
