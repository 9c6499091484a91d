//! Drink history loading.
//!
//! The drink log lives in two places: the compacted CSV archive written by
//! `rollup` and the WAL of entries appended since. Loading replays the WAL on
//! top of the archive.

use crate::wal::{read_entries_unlocked, DrinkLogEntry, WalLock};
use crate::{AlcoholType, Drink, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// CSV row format for archived drinks
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    id: String,
    user_id: String,
    plan_id: Option<String>,
    name: String,
    alcohol_type: String,
    estimated_oz: f64,
    estimated_abv: f64,
    logged_at: String,
}

impl From<&Drink> for CsvRow {
    fn from(drink: &Drink) -> Self {
        CsvRow {
            id: drink.id.to_string(),
            user_id: drink.user_id.clone(),
            plan_id: drink.plan_id.clone(),
            name: drink.name.clone(),
            alcohol_type: drink.alcohol_type.to_string(),
            estimated_oz: drink.estimated_oz,
            estimated_abv: drink.estimated_abv,
            logged_at: drink.logged_at.to_rfc3339(),
        }
    }
}

impl TryFrom<CsvRow> for Drink {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let logged_at = DateTime::parse_from_rfc3339(&row.logged_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let alcohol_type: AlcoholType = row.alcohol_type.parse()?;

        Ok(Drink {
            id,
            user_id: row.user_id,
            plan_id: row.plan_id.filter(|p| !p.is_empty()),
            name: row.name,
            alcohol_type,
            estimated_oz: row.estimated_oz,
            estimated_abv: row.estimated_abv,
            logged_at,
        })
    }
}

/// Apply log entries, in order, on top of an existing drink list
pub fn replay(mut drinks: Vec<Drink>, entries: impl IntoIterator<Item = DrinkLogEntry>) -> Vec<Drink> {
    for entry in entries {
        match entry {
            DrinkLogEntry::Logged { drink } => {
                if drinks.iter().any(|d| d.id == drink.id) {
                    tracing::debug!("Skipping duplicate drink {}", drink.id);
                } else {
                    drinks.push(drink);
                }
            }
            DrinkLogEntry::Removed { id, .. } => drinks.retain(|d| d.id != id),
            DrinkLogEntry::Cleared { .. } => drinks.clear(),
        }
    }
    drinks
}

/// Load the full drink log (archive plus WAL), oldest first
pub fn load_drinks(wal_path: &Path, csv_path: &Path) -> Result<Vec<Drink>> {
    // Archive and WAL must be read as one snapshot; rollup rewrites both.
    let _lock = match wal_path.parent() {
        Some(dir) if dir.exists() => Some(WalLock::shared(wal_path)?),
        _ => None,
    };

    let archived = if csv_path.exists() {
        load_drinks_from_csv(csv_path)?
    } else {
        Vec::new()
    };
    let archived_count = archived.len();

    let entries = read_entries_unlocked(wal_path)?;
    let entry_count = entries.len();

    let mut drinks = replay(archived, entries);
    drinks.sort_by(|a, b| a.logged_at.cmp(&b.logged_at));

    tracing::debug!(
        "Loaded {} drinks ({} archived, {} WAL entries)",
        drinks.len(),
        archived_count,
        entry_count
    );

    Ok(drinks)
}

/// Load drinks logged within the last `hours` before `now`, oldest first
pub fn load_recent_drinks(
    wal_path: &Path,
    csv_path: &Path,
    now: DateTime<Utc>,
    hours: i64,
) -> Result<Vec<Drink>> {
    let window = crate::store::window_duration(hours);
    let drinks: Vec<Drink> = load_drinks(wal_path, csv_path)?
        .into_iter()
        .filter(|d| now - d.logged_at < window)
        .collect();

    tracing::info!("Loaded {} drinks from last {} hours", drinks.len(), hours);
    Ok(drinks)
}

/// Load all drinks from a CSV archive, skipping unreadable rows
pub(crate) fn load_drinks_from_csv(path: &Path) -> Result<Vec<Drink>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut drinks = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match Drink::try_from(row) {
                Ok(drink) => drinks.push(drink),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(drinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{quick_log_drink, DrinkKind};
    use crate::wal::{DrinkSink, JsonlSink};
    use chrono::Duration;

    fn drink_hours_ago(kind: DrinkKind, hours: i64) -> Drink {
        quick_log_drink(kind, "user-1", None, Utc::now() - Duration::hours(hours))
    }

    #[test]
    fn test_replay_applies_removals_and_clears() {
        let a = drink_hours_ago(DrinkKind::Beer, 3);
        let b = drink_hours_ago(DrinkKind::Wine, 2);
        let c = drink_hours_ago(DrinkKind::Shot, 1);

        let entries = vec![
            DrinkLogEntry::Logged { drink: a.clone() },
            DrinkLogEntry::Cleared { at: Utc::now() },
            DrinkLogEntry::Logged { drink: b.clone() },
            DrinkLogEntry::Logged { drink: c.clone() },
            DrinkLogEntry::Removed { id: b.id, at: Utc::now() },
        ];

        let drinks = replay(Vec::new(), entries);
        assert_eq!(drinks, vec![c]);
    }

    #[test]
    fn test_replay_ignores_duplicate_logs() {
        let a = drink_hours_ago(DrinkKind::Beer, 1);
        let entries = vec![
            DrinkLogEntry::Logged { drink: a.clone() },
            DrinkLogEntry::Logged { drink: a.clone() },
        ];
        assert_eq!(replay(vec![a.clone()], entries).len(), 1);
    }

    #[test]
    fn test_load_drinks_sorted_oldest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("drinks.wal");
        let csv_path = temp_dir.path().join("drinks.csv");

        let mut sink = JsonlSink::new(&wal_path);
        let newer = drink_hours_ago(DrinkKind::Beer, 1);
        let older = drink_hours_ago(DrinkKind::Wine, 5);
        sink.append(&DrinkLogEntry::Logged { drink: newer.clone() }).unwrap();
        sink.append(&DrinkLogEntry::Logged { drink: older.clone() }).unwrap();

        let drinks = load_drinks(&wal_path, &csv_path).unwrap();
        assert_eq!(drinks[0].id, older.id);
        assert_eq!(drinks[1].id, newer.id);
    }

    #[test]
    fn test_load_recent_drinks_applies_window() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("drinks.wal");
        let csv_path = temp_dir.path().join("drinks.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&DrinkLogEntry::Logged { drink: drink_hours_ago(DrinkKind::Beer, 1) })
            .unwrap();
        sink.append(&DrinkLogEntry::Logged { drink: drink_hours_ago(DrinkKind::Ipa, 11) })
            .unwrap();
        sink.append(&DrinkLogEntry::Logged { drink: drink_hours_ago(DrinkKind::Wine, 30) })
            .unwrap();

        let drinks = load_recent_drinks(&wal_path, &csv_path, Utc::now(), 12).unwrap();
        assert_eq!(drinks.len(), 2);
    }

    #[test]
    fn test_wal_removal_applies_to_archived_drink() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("drinks.wal");
        let csv_path = temp_dir.path().join("drinks.csv");

        let drink = drink_hours_ago(DrinkKind::Martini, 2);
        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&DrinkLogEntry::Logged { drink: drink.clone() }).unwrap();
        crate::rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&DrinkLogEntry::Removed { id: drink.id, at: Utc::now() })
            .unwrap();

        let drinks = load_drinks(&wal_path, &csv_path).unwrap();
        assert!(drinks.is_empty());
    }

    #[test]
    fn test_csv_row_conversion_keeps_fields() {
        let mut drink = drink_hours_ago(DrinkKind::LongIsland, 1);
        drink.plan_id = Some("plan-7".into());

        let back = Drink::try_from(CsvRow::from(&drink)).unwrap();
        assert_eq!(back.id, drink.id);
        assert_eq!(back.plan_id, drink.plan_id);
        assert_eq!(back.alcohol_type, drink.alcohol_type);
        assert_eq!(back.estimated_abv, drink.estimated_abv);
        assert_eq!(back.logged_at, drink.logged_at);
    }
}
