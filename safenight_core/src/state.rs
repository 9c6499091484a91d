//! User profile persistence with file locking.
//!
//! This module handles saving and loading the profile the BAC engine reads
//! (weight and sex) with proper file locking to prevent concurrent access issues.

use crate::{Error, Result, UserProfile};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserProfile {
    /// Load a profile from a file with shared locking
    ///
    /// Returns `None` if the file doesn't exist or cannot be read; an
    /// unreadable or invalid profile is logged and ignored so callers can fall
    /// back to configured defaults.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::info!("No profile file found, using configured defaults");
            return Ok(None);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open profile file {:?}: {}. Using defaults.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock profile file {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read profile file {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        let profile = match serde_json::from_str::<UserProfile>(&contents) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to parse profile file {:?}: {}. Using defaults.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = profile.validate() {
            tracing::warn!("Ignoring invalid profile in {:?}: {}", path, e);
            return Ok(None);
        }

        tracing::debug!("Loaded profile from {:?}", path);
        Ok(Some(profile))
    }

    /// Save the profile with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let parent = path
            .parent()
            .ok_or_else(|| Error::State("profile path missing parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load the profile (or `default`), modify it, and save it back
    pub fn update<F>(path: &Path, default: UserProfile, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserProfile) -> Result<()>,
    {
        let mut profile = Self::load(path)?.unwrap_or(default);
        f(&mut profile)?;
        profile.save(path)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sex;

    fn sample() -> UserProfile {
        UserProfile {
            user_id: "user-1".into(),
            weight_lbs: 150.0,
            sex: Sex::Other,
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        sample().save(&path).unwrap();
        let loaded = UserProfile::load(&path).unwrap();

        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        assert!(UserProfile::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_profile_is_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        assert!(UserProfile::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_invalid_weight_on_disk_is_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");
        std::fs::write(&path, r#"{"user_id":"u","weight_lbs":-5,"sex":"female"}"#).unwrap();

        assert!(UserProfile::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_rejects_invalid_profile() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        let mut profile = sample();
        profile.weight_lbs = 0.0;
        assert!(profile.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        UserProfile::update(&path, sample(), |p| {
            p.weight_lbs = 125.0;
            Ok(())
        })
        .unwrap();

        let loaded = UserProfile::load(&path).unwrap().unwrap();
        assert_eq!(loaded.weight_lbs, 125.0);
        assert_eq!(loaded.sex, Sex::Other);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        sample().save(&path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "profile.json")
            .collect();
        assert!(extras.is_empty(), "Found extras: {:?}", extras);
    }
}
