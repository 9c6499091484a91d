//! WAL compaction into the CSV archive.
//!
//! Rollup replays the WAL on top of the current archive and rewrites the
//! archive with the result, so removals and clears recorded in the WAL are
//! folded in before the WAL is retired.

use crate::history::{load_drinks_from_csv, replay, CsvRow};
use crate::wal::{read_entries_unlocked, WalLock};
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// Compact WAL entries into the CSV archive and archive the WAL atomically
///
/// The WAL lock is held exclusively for the whole operation, so no entry can
/// be appended between the read and the rename. This function:
/// 1. Reads all entries from the WAL
/// 2. Replays them on top of the drinks already in the CSV
/// 3. Writes the result to a temp file and syncs it to disk
/// 4. Renames the temp file over the CSV
/// 5. Renames the WAL to `.wal.processed`
///
/// Returns the number of WAL entries processed.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let _lock = WalLock::exclusive(wal_path)?;
    let entries = read_entries_unlocked(wal_path)?;

    if entries.is_empty() {
        tracing::info!("No entries in WAL to roll up");
        return Ok(0);
    }
    let entry_count = entries.len();

    let archived = if csv_path.exists() {
        load_drinks_from_csv(csv_path)?
    } else {
        Vec::new()
    };

    let mut drinks = replay(archived, entries);
    drinks.sort_by(|a, b| a.logged_at.cmp(&b.logged_at));

    let parent = csv_path
        .parent()
        .ok_or_else(|| Error::State("archive path missing parent".into()))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());
        for drink in &drinks {
            writer.serialize(CsvRow::from(drink))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Wrote {} drinks to CSV archive", drinks.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(entry_count)
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
