//! Cache of parsed documents keyed by canonical path
//!
//! Entries are invalidated when the file on disk is modified after the
//! entry was stored, or when they outlive the configured maximum age.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::loader::error::{LoaderError, LoaderResult};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A parsed document together with the file state it was parsed from
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub document: Value,
    pub stored_at: SystemTime,
    pub file_mtime: SystemTime,
}

impl CachedDocument {
    fn is_fresh(&self, current_mtime: SystemTime, max_age: Option<Duration>) -> bool {
        if current_mtime > self.file_mtime {
            return false;
        }
        match (max_age, self.stored_at.elapsed()) {
            (Some(limit), Ok(age)) => age <= limit,
            _ => true,
        }
    }
}

/// Cache behavior knobs
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Number of documents kept before the least recently used is evicted
    pub max_entries: usize,
    pub max_age: Option<Duration>,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            max_age: None,
            enabled: true,
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// LRU document cache
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<PathBuf, CachedDocument>,
    recency: VecDeque<PathBuf>,
    config: CacheConfig,
    stats: CacheStats,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    /// Return the cached document for `path` if it is still fresh
    pub fn get(&mut self, path: &Path) -> LoaderResult<Option<Value>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let key = canonical(path)?;
        let current_mtime = modified_time(path)?;

        let fresh = match self.entries.get(&key) {
            Some(entry) => entry.is_fresh(current_mtime, self.config.max_age),
            None => {
                self.stats.misses += 1;
                return Ok(None);
            }
        };

        if !fresh {
            self.remove_key(&key);
            self.stats.misses += 1;
            return Ok(None);
        }

        self.touch(&key);
        self.stats.hits += 1;
        Ok(self.entries.get(&key).map(|entry| entry.document.clone()))
    }

    /// Store a parsed document for `path`
    pub fn put(&mut self, path: &Path, document: Value) -> LoaderResult<()> {
        if !self.config.enabled || self.config.max_entries == 0 {
            return Ok(());
        }

        let key = canonical(path)?;
        let file_mtime = modified_time(path)?;

        while self.entries.len() >= self.config.max_entries && !self.entries.contains_key(&key) {
            match self.recency.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.stats.evictions += 1;
                }
                None => break,
            }
        }

        self.entries.insert(
            key.clone(),
            CachedDocument {
                document,
                stored_at: SystemTime::now(),
                file_mtime,
            },
        );
        self.touch(&key);
        Ok(())
    }

    pub fn remove(&mut self, path: &Path) -> LoaderResult<()> {
        let key = canonical(path)?;
        self.remove_key(&key);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn touch(&mut self, key: &Path) {
        self.recency.retain(|p| p != key);
        self.recency.push_back(key.to_path_buf());
    }

    fn remove_key(&mut self, key: &Path) {
        self.entries.remove(key);
        self.recency.retain(|p| p != key);
    }
}

fn canonical(path: &Path) -> LoaderResult<PathBuf> {
    path.canonicalize()
        .map_err(|e| LoaderError::io_error(path.to_path_buf(), e))
}

fn modified_time(path: &Path) -> LoaderResult<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| LoaderError::io_error(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_put_and_get() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api.json");
        fs::write(&path, "{}")?;

        let mut cache = DocumentCache::new();
        assert!(cache.get(&path)?.is_none());

        cache.put(&path, json!({"swagger": "2.0"}))?;
        assert_eq!(cache.get(&path)?, Some(json!({"swagger": "2.0"})));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        Ok(())
    }

    #[test]
    fn test_lru_eviction() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let paths: Vec<_> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("doc{i}.json"));
                fs::write(&p, "{}").unwrap();
                p
            })
            .collect();

        let mut cache = DocumentCache::with_config(CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        });

        cache.put(&paths[0], json!(0))?;
        cache.put(&paths[1], json!(1))?;
        // touch doc0 so doc1 becomes the eviction candidate
        cache.get(&paths[0])?;
        cache.put(&paths[2], json!(2))?;

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&paths[1])?.is_none());
        assert_eq!(cache.get(&paths[0])?, Some(json!(0)));
        assert_eq!(cache.stats().evictions, 1);
        Ok(())
    }

    #[test]
    fn test_disabled_cache() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api.json");
        fs::write(&path, "{}")?;

        let mut cache = DocumentCache::with_config(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        cache.put(&path, json!({}))?;
        assert!(cache.is_empty());
        assert!(cache.get(&path)?.is_none());
        Ok(())
    }

    #[test]
    fn test_remove_and_clear() -> LoaderResult<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api.json");
        fs::write(&path, "{}")?;

        let mut cache = DocumentCache::new();
        cache.put(&path, json!({}))?;
        cache.remove(&path)?;
        assert!(cache.is_empty());

        cache.put(&path, json!({}))?;
        cache.clear();
        assert_eq!(cache.len(), 0);
        Ok(())
    }
}
