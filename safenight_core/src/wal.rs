//! Write-Ahead Log (WAL) for the drink log.
//!
//! Drink mutations are appended to a JSONL (JSON Lines) file. Writers,
//! readers and rollup coordinate through an fs2 lock on a sidecar
//! `<wal>.lock` file. Drinks are never edited in
//! place: removals and clears are recorded as their own entries and applied
//! on replay (see `history`).

use crate::{Drink, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One mutation of the drink log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrinkLogEntry {
    Logged { drink: Drink },
    Removed { id: Uuid, at: DateTime<Utc> },
    Cleared { at: DateTime<Utc> },
}

/// Drink sink trait for persisting log entries
pub trait DrinkSink {
    fn append(&mut self, entry: &DrinkLogEntry) -> Result<()>;
}

/// Advisory lock on a WAL, held on a sidecar `.lock` file
///
/// The sidecar is never renamed, so a writer queued behind rollup always
/// reopens the live WAL path after acquiring it.
pub(crate) struct WalLock {
    file: File,
}

impl WalLock {
    fn open(wal_path: &Path) -> Result<File> {
        if let Some(parent) = wal_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(wal_path))?;
        Ok(file)
    }

    /// Block until no one else holds the lock
    pub(crate) fn exclusive(wal_path: &Path) -> Result<Self> {
        let file = Self::open(wal_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    /// Block until no writer holds the lock
    pub(crate) fn shared(wal_path: &Path) -> Result<Self> {
        let file = Self::open(wal_path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }
}

impl Drop for WalLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release WAL lock: {}", e);
        }
    }
}

/// Path of the lock file guarding `wal_path`
pub fn lock_path(wal_path: &Path) -> PathBuf {
    let mut name = wal_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// JSONL-based drink sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// True when the file is non-empty and its last byte is not a newline
fn ends_mid_line(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl DrinkSink for JsonlSink {
    fn append(&mut self, entry: &DrinkLogEntry) -> Result<()> {
        let _lock = WalLock::exclusive(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(entry)?;
        let mut buf = Vec::with_capacity(line.len() + 2);
        // A torn write from a crash left no newline; terminate it so the
        // new entry starts on its own line.
        if ends_mid_line(&mut file)? {
            tracing::warn!("WAL {:?} ends mid-line, terminating it", self.path);
            buf.push(b'\n');
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        file.write_all(&buf)?;
        file.flush()?;

        tracing::debug!("Appended {:?} entry to WAL", entry_kind(entry));
        Ok(())
    }
}

fn entry_kind(entry: &DrinkLogEntry) -> &'static str {
    match entry {
        DrinkLogEntry::Logged { .. } => "logged",
        DrinkLogEntry::Removed { .. } => "removed",
        DrinkLogEntry::Cleared { .. } => "cleared",
    }
}

/// Read all entries from a WAL file, in append order
///
/// Lines that fail to parse (e.g. a torn final write) are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<DrinkLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let _lock = WalLock::shared(path)?;
    read_entries_unlocked(path)
}

/// Read entries while the caller already holds a [`WalLock`]
pub(crate) fn read_entries_unlocked(path: &Path) -> Result<Vec<DrinkLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DrinkLogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse WAL entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Read {} entries from WAL", entries.len());
    Ok(entries)
}
