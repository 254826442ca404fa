//! Atomic JSON persistence shared by [`crate::knowledge_base::KnowledgeBase`]
//! and [`crate::map_cache::MapCache`]: write to a sibling temp file, then
//! rename over the target so readers never observe a partially-written
//! store (§5 suspension-point requirement: disk I/O must be atomic from a
//! reader's perspective).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Serializes `value` as pretty JSON and atomically replaces `path`.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing store")?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json).with_context(|| format!("writing temp file {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Loads and deserializes `path`. A missing file yields `Ok(None)` so
/// callers can fall back to an empty store on first run.
pub fn load_if_present<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let value = serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn round_trips_through_atomic_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        save_atomic(&path, &Sample { value: 42 }).unwrap();
        let loaded: Option<Sample> = load_if_present(&path).unwrap();
        assert_eq!(loaded, Some(Sample { value: 42 }));
    }

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let loaded: Option<Sample> = load_if_present(&path).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn leaves_no_temp_file_behind_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        save_atomic(&path, &Sample { value: 1 }).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
