use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "footy_terminal";

const DEFAULT_TTL_SECS: u64 = 900;

/// Keyed JSON response store with a time-to-live. One file per cache,
/// loaded once and rewritten atomically on every set.
pub struct TtlCache {
    path: Option<PathBuf>,
    ttl: Duration,
    file: Mutex<CacheFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    fetched_at: u64,
}

impl TtlCache {
    pub fn open(name: &str, ttl: Duration) -> Self {
        let path = app_cache_dir().map(|dir| dir.join(format!("{name}.json")));
        Self::at_path(path, ttl)
    }

    fn at_path(path: Option<PathBuf>, ttl: Duration) -> Self {
        let file = path.as_deref().map(load_cache_file).unwrap_or_default();
        Self {
            path,
            ttl,
            file: Mutex::new(file),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = now_secs()?;
        let guard = self.file.lock().expect("ttl cache lock poisoned");
        let entry = guard.entries.get(key)?;
        if !is_fresh(entry.fetched_at, now, self.ttl) {
            return None;
        }
        Some(entry.body.clone())
    }

    pub fn set(&self, key: &str, body: &str) {
        let fetched_at = now_secs().unwrap_or_default();
        let mut guard = self.file.lock().expect("ttl cache lock poisoned");
        guard.version = CACHE_VERSION;
        guard.entries.insert(
            key.to_string(),
            CacheEntry {
                body: body.to_string(),
                fetched_at,
            },
        );
        if let Some(path) = self.path.as_deref() {
            let _ = save_cache_file(path, &guard);
        }
    }
}

fn is_fresh(fetched_at: u64, now: u64, ttl: Duration) -> bool {
    now.saturating_sub(fetched_at) <= ttl.as_secs()
}

fn load_cache_file(path: &std::path::Path) -> CacheFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return CacheFile::default();
    };
    let file = serde_json::from_str::<CacheFile>(&raw).unwrap_or_default();
    if file.version != CACHE_VERSION {
        return CacheFile::default();
    }
    file
}

fn save_cache_file(path: &std::path::Path, file: &CacheFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(file).context("serialize response cache")?;
    fs::write(&tmp, json).context("write response cache")?;
    fs::rename(&tmp, path).context("swap response cache")?;
    Ok(())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_ttl() -> Duration {
    let secs = std::env::var("CACHE_TTL_SECS")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TTL_SECS)
        .max(30);
    Duration::from_secs(secs)
}

fn now_secs() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_ttl() {
        let ttl = Duration::from_secs(900);
        assert!(is_fresh(1_000, 1_000, ttl));
        assert!(is_fresh(1_000, 1_900, ttl));
        assert!(!is_fresh(1_000, 1_901, ttl));
        // Clock moved backwards: treat as fresh rather than panicking.
        assert!(is_fresh(2_000, 1_000, ttl));
    }

    #[test]
    fn set_then_get_round_trips_in_memory() {
        let cache = TtlCache::at_path(None, Duration::from_secs(60));
        assert!(cache.get("k").is_none());
        cache.set("k", "{\"ok\":true}");
        assert_eq!(cache.get("k").as_deref(), Some("{\"ok\":true}"));
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn persists_across_instances() {
        let path = std::env::temp_dir().join(format!(
            "footy_ttl_cache_test_{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let cache = TtlCache::at_path(Some(path.clone()), Duration::from_secs(60));
        cache.set("standings", "[1,2,3]");
        drop(cache);

        let reopened = TtlCache::at_path(Some(path.clone()), Duration::from_secs(60));
        assert_eq!(reopened.get("standings").as_deref(), Some("[1,2,3]"));
        let _ = fs::remove_file(&path);
    }
}
