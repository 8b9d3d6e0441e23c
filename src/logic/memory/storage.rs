//! Memory Snapshots
//!
//! JSON export written to a sibling temp file and renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};

use super::integrity::integrity_root;
use super::store::MemoryStore;
use super::types::MemoryExport;
use crate::error::{PipelineError, PipelineResult};

/// Default snapshot location
pub fn get_default_snapshot_path() -> PathBuf {
    PathBuf::from(".").join("immune-memory").join("memory_v1.json")
}

/// Write `store.export()` to `path` atomically
pub fn save_snapshot(store: &MemoryStore, path: &Path) -> PipelineResult<MemoryExport> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let export = store.export();
    let json = serde_json::to_vec_pretty(&export)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    log::info!(
        "Saved memory snapshot ({} records, root {}) to {}",
        export.records.len(),
        export.integrity_root,
        path.display()
    );
    Ok(export)
}

/// Read a snapshot and verify its integrity root
pub fn load_snapshot(path: &Path) -> PipelineResult<MemoryExport> {
    let data = fs::read(path)?;
    let export: MemoryExport = serde_json::from_slice(&data)?;

    let recomputed = integrity_root(export.records.iter().map(|r| &r.signature));
    if recomputed != export.integrity_root {
        return Err(PipelineError::Persistence(format!(
            "integrity root mismatch: stored {}, recomputed {}",
            export.integrity_root, recomputed
        )));
    }

    Ok(export)
}

impl MemoryStore {
    pub fn save_to(&self, path: &Path) -> PipelineResult<MemoryExport> {
        save_snapshot(self, path)
    }

    /// Replace the store's content with a verified snapshot
    pub fn load_from(&self, path: &Path) -> PipelineResult<usize> {
        let export = load_snapshot(path)?;
        let count = export.records.len();
        self.restore(export.records);
        log::info!("Restored {} memory records from {}", count, path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::events::Features;
    use crate::logic::threat::ThreatVerdict;
    use chrono::Utc;

    fn verdict(value: f64) -> ThreatVerdict {
        let mut features = Features::new();
        features.insert("value_anomaly".to_string(), value);
        ThreatVerdict {
            event_id: format!("tx-{}", value),
            observed_at: Utc::now(),
            score: 0.97,
            features,
            is_threat: true,
            votes: 50,
            responded: 50,
        }
    }

    #[test]
    fn test_snapshot_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");

        let store = MemoryStore::default();
        store.learn(&verdict(10.0), 0.8).unwrap();
        store.learn(&verdict(20.0), 0.5).unwrap();
        store.learn(&verdict(20.0), 0.0).unwrap();

        let saved = save_snapshot(&store, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let restored = MemoryStore::default();
        assert_eq!(restored.load_from(&path).unwrap(), 2);
        assert_eq!(restored.integrity_root(), saved.integrity_root);
        assert_eq!(restored.export(), store.export());
    }

    #[test]
    fn test_tampered_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let store = MemoryStore::default();
        store.learn(&verdict(42.0), 0.8).unwrap();
        let mut export = save_snapshot(&store, &path).unwrap();
        export.integrity_root = "0".repeat(64);
        fs::write(&path, serde_json::to_vec(&export).unwrap()).unwrap();

        assert!(matches!(load_snapshot(&path), Err(PipelineError::Persistence(_))));
    }
}
