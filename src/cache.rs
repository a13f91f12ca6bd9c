//! Persistent geocode cache.
//!
//! Maps a normalized address to either a coordinate or a confirmed "not
//! found" marker. The on-disk format is a single JSON object:
//! `{ "<address>": [lat, lng] | null }`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::model::Coordinate;

/// Three-valued cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    Resolved(Coordinate),
    NotFound,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total: usize,
    pub resolved: usize,
    pub not_found: usize,
}

/// Address-keyed geocode results, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    path: Option<PathBuf>,
    entries: RwLock<HashMap<String, Option<Coordinate>>>,
    flush_lock: Mutex<()>,
}

impl GeocodeCache {
    /// A cache with no backing file. `flush` is a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache at `path`, or starts empty if the file is missing or
    /// unreadable. A corrupt file is logged and ignored.
    pub fn load_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(Some(entries)) => {
                info!(path = %path.display(), entries = entries.len(), "loaded geocode cache");
                entries
            }
            Ok(None) => HashMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "geocode cache unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            entries: RwLock::new(entries),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Looks up a normalized address.
    pub fn get(&self, address: &str) -> Lookup {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(address) {
            Some(Some(coordinate)) => Lookup::Resolved(*coordinate),
            Some(None) => Lookup::NotFound,
            None => Lookup::Unknown,
        }
    }

    /// Upserts an entry. `None` records a confirmed "not found".
    pub fn put(&self, address: &str, coordinate: Option<Coordinate>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(address.to_string(), coordinate);
    }

    /// Number of entries, including "not found" markers.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry counts split by outcome.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let resolved = entries.values().filter(|value| value.is_some()).count();
        CacheStats {
            total: entries.len(),
            resolved,
            not_found: entries.len() - resolved,
        }
    }

    /// Writes the full map to the backing file.
    ///
    /// The snapshot is serialized under the read lock, so a concurrent `put`
    /// either lands entirely before or entirely after it. Concurrent flushes
    /// are serialized and the file is replaced atomically via rename.
    pub fn flush(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let data = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_vec_pretty(&*entries)?
        };

        let tmp_path = path.with_extension("tmp");
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut writer = BufWriter::new(File::create(&tmp_path).map_err(io_err)?);
        writer.write_all(&data).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        drop(writer);
        fs::rename(&tmp_path, path).map_err(io_err)?;

        debug!(path = %path.display(), bytes = data.len(), "flushed geocode cache");
        Ok(())
    }

    /// Empties the cache and removes its backing file.
    pub fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();

        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!(path = %path.display(), "removed geocode cache");
            }
        }
        Ok(())
    }
}

/// Reads the cache file. Entries with an unexpected shape are skipped.
fn read_entries(path: &Path) -> Result<Option<HashMap<String, Option<Coordinate>>>, CacheError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: HashMap<String, Value> = serde_json::from_slice(&data)?;

    let mut entries = HashMap::with_capacity(raw.len());
    let mut skipped = 0usize;
    for (address, value) in raw {
        match value {
            Value::Null => {
                entries.insert(address, None);
            }
            other => match serde_json::from_value::<Coordinate>(other) {
                Ok(coordinate) => {
                    entries.insert(address, Some(coordinate));
                }
                Err(_) => skipped += 1,
            },
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "ignored malformed geocode cache entries");
    }
    Ok(Some(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_vs_not_found() {
        let cache = GeocodeCache::in_memory();
        cache.put("CARRER MAJOR 1", None);
        assert_eq!(cache.get("CARRER MAJOR 1"), Lookup::NotFound);
        assert_eq!(cache.get("CARRER MAJOR 2"), Lookup::Unknown);
    }

    #[test]
    fn test_put_is_upsert() {
        let cache = GeocodeCache::in_memory();
        cache.put("A", None);
        cache.put("A", Some(Coordinate::new(1.0, 2.0)));
        cache.put("A", Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(cache.get("A"), Lookup::Resolved(Coordinate::new(1.0, 2.0)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = GeocodeCache::load_or_empty(&path);
        cache.put("A", Some(Coordinate::new(41.47855, 2.07228)));
        cache.put("B", None);
        cache.put("C", Some(Coordinate::new(-33.123456789, 151.987654321)));
        cache.flush().unwrap();

        let reloaded = GeocodeCache::load_or_empty(&path);
        for address in ["A", "B", "C"] {
            assert_eq!(reloaded.get(address), cache.get(address), "mismatch for {}", address);
        }
        assert_eq!(reloaded.get("D"), Lookup::Unknown);
        assert_eq!(reloaded.stats(), CacheStats { total: 3, resolved: 2, not_found: 1 });
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = GeocodeCache::load_or_empty(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"A": [1.0, 2.0], "B": null, "C": "oops", "D": [1.0], "E": {"lat": 1}}"#,
        )
        .unwrap();

        let cache = GeocodeCache::load_or_empty(&path);
        assert_eq!(cache.get("A"), Lookup::Resolved(Coordinate::new(1.0, 2.0)));
        assert_eq!(cache.get("B"), Lookup::NotFound);
        assert_eq!(cache.get("C"), Lookup::Unknown);
        assert_eq!(cache.get("D"), Lookup::Unknown);
        assert_eq!(cache.get("E"), Lookup::Unknown);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = GeocodeCache::load_or_empty(&path);
        cache.put("A", None);
        cache.flush().unwrap();
        assert!(path.exists());

        cache.clear().unwrap();
        assert!(!path.exists());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_flush_concurrent_with_put() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = GeocodeCache::load_or_empty(&path);

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..50 {
                        cache.put(&format!("{}-{}", worker, i), Some(Coordinate::new(i as f64, 0.0)));
                        if i % 10 == 0 {
                            cache.flush().unwrap();
                        }
                    }
                });
            }
        });
        cache.flush().unwrap();

        let reloaded = GeocodeCache::load_or_empty(&path);
        assert_eq!(reloaded.len(), 200);
    }

    #[test]
    fn test_in_memory_flush_is_noop() {
        let cache = GeocodeCache::in_memory();
        cache.put("A", None);
        assert!(cache.flush().is_ok());
        assert!(cache.path().is_none());
    }
}
