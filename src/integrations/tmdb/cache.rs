// src/integrations/tmdb/cache.rs
//
// Persistent metadata cache
//
// A flat string-keyed JSON map, loaded at startup and persisted at shutdown
// (including error paths). Reference data is assumed immutable, so entries
// never expire; upstream title corrections require deleting the file.

use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub struct MetadataCache {
    path: PathBuf,
    entries: HashMap<String, Value>,
}

impl MetadataCache {
    /// Load the cache file, falling back to an empty cache on any failure.
    pub fn load(path: &Path) -> Self {
        let entries = if path.exists() {
            debug!("Loading TMDb cache from {}", path.display());
            match std::fs::read_to_string(path)
                .map_err(AppError::Io)
                .and_then(|raw| serde_json::from_str(&raw).map_err(AppError::Serialization))
            {
                Ok(map) => map,
                Err(e) => {
                    error!("Failed to load TMDb cache: {}. Starting with an empty cache.", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.entries.insert(key.to_string(), json);
            }
            Err(e) => error!("Failed to serialize cache entry '{}': {}", key, e),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache back to disk.
    pub fn persist(&self) -> AppResult<()> {
        debug!("Saving TMDb cache to {}", self.path.display());
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, raw).map_err(AppError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceMovie;

    #[test]
    fn test_missing_file_yields_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::load(&dir.path().join("absent.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_yields_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = MetadataCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_get_persist_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let movie = ReferenceMovie {
            title: Some("X".to_string()),
            release_date: Some("2024-05-01".to_string()),
        };

        let mut cache = MetadataCache::load(&path);
        cache.set("movie_603", &movie);
        assert!(cache.contains("movie_603"));
        cache.persist().unwrap();

        let reloaded = MetadataCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        let restored: ReferenceMovie = reloaded.get("movie_603").unwrap();
        assert_eq!(restored.title.as_deref(), Some("X"));
        assert_eq!(restored.release_year(), "2024");
    }

    #[test]
    fn test_get_with_wrong_shape_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = MetadataCache::load(&dir.path().join("cache.json"));
        cache.set("series_1", &"just a string");

        let value: Option<crate::domain::ReferenceSeries> = cache.get("series_1");
        assert!(value.is_none());
    }
}
