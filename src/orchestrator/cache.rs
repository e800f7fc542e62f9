//! The orchestrator's write-once, on-disk order cache.
//!
//! Entries are keyed by `(instance, method)` and stored as one file per key
//! holding the whitespace-separated leaf-id string (see
//! [crate::order::LeafOrder::to_space_separated]). Writes go to a temp file
//! in the same directory followed by a rename, which is atomic on the POSIX
//! filesystems this crate targets, so a reader never observes a torn file.
//! An in-process [DashMap] sits in front of the filesystem so repeated
//! requests for the same key within one process never re-touch disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use thiserror::Error;

use crate::orchestrator::Method;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to create cache directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cache entry {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read cache entry {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Two-tier cache: an in-process [DashMap] over a directory of one file per
/// `(instance, method)` key.
pub struct Cache {
    dir: PathBuf,
    memory: DashMap<String, String>,
}

impl Cache {
    pub fn new(dir: PathBuf) -> Self {
        Cache {
            dir,
            memory: DashMap::new(),
        }
    }

    fn key(instance: &str, method: Method) -> String {
        format!("{instance}__{method}")
    }

    fn path_for(&self, instance: &str, method: Method) -> PathBuf {
        self.dir.join(format!("{}.order", Self::key(instance, method)))
    }

    /// Look up a cached order, checking the in-process map before the
    /// filesystem. A filesystem hit is copied into the in-process map.
    pub fn get(&self, instance: &str, method: Method) -> Result<Option<String>, CacheError> {
        let key = Self::key(instance, method);
        if let Some(hit) = self.memory.get(&key) {
            return Ok(Some(hit.clone()));
        }

        let path = self.path_for(instance, method);
        if !path.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|source| CacheError::Read {
            path: path.clone(),
            source,
        })?;
        self.memory.insert(key, contents.clone());
        Ok(Some(contents))
    }

    /// Write `value` under `(instance, method)`, both in-process and to
    /// disk. Never called with an empty order: the orchestrator filters
    /// that out before reaching the cache.
    pub fn put(&self, instance: &str, method: Method, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(instance, method);
        let tmp_path = self.dir.join(format!(
            "{}.order.tmp.{}",
            Self::key(instance, method),
            std::process::id()
        ));

        fs::write(&tmp_path, value).map_err(|source| CacheError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;

        self.memory.insert(Self::key(instance, method), value.to_string());
        Ok(())
    }
}

/// Whether `dir` already holds a cache entry for `(instance, method)`,
/// without reading its contents. Exposed for tests and CLI diagnostics.
pub fn entry_path(dir: &Path, instance: &str, method: Method) -> PathBuf {
    dir.join(format!("{}.order", Cache::key(instance, method)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = env::temp_dir();
        dir.push(format!("nodetrix-order-cache-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn miss_then_hit_after_put() {
        let dir = temp_dir("miss-then-hit");
        let cache = Cache::new(dir.clone());
        assert_eq!(cache.get("demo", Method::Heuristic).unwrap(), None);
        cache.put("demo", Method::Heuristic, "1 2 3").unwrap();
        assert_eq!(
            cache.get("demo", Method::Heuristic).unwrap(),
            Some("1 2 3".to_string())
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn distinct_methods_are_distinct_keys() {
        let dir = temp_dir("distinct-methods");
        let cache = Cache::new(dir.clone());
        cache.put("demo", Method::Heuristic, "1 2").unwrap();
        cache.put("demo", Method::Ilp, "2 1").unwrap();
        assert_eq!(cache.get("demo", Method::Heuristic).unwrap().unwrap(), "1 2");
        assert_eq!(cache.get("demo", Method::Ilp).unwrap().unwrap(), "2 1");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn survives_a_fresh_cache_instance_reading_the_same_dir() {
        let dir = temp_dir("survives-restart");
        {
            let cache = Cache::new(dir.clone());
            cache.put("demo", Method::Hybrid, "a b c").unwrap();
        }
        let cache = Cache::new(dir.clone());
        assert_eq!(
            cache.get("demo", Method::Hybrid).unwrap(),
            Some("a b c".to_string())
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
