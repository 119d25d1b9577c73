// src/history/mod.rs

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::reconcile::DonationSnapshot;

/// Best-effort local copy of the last accepted snapshot, used only to show
/// something on restart before the first fetch lands. Never authoritative.
#[derive(Clone, Debug)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot` as JSON via a temp file + rename.
    pub fn save(&self, snapshot: &DonationSnapshot) -> Result<()> {
        if !snapshot.total_amount.is_finite() {
            bail!("refusing to cache non-finite total {}", snapshot.total_amount);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {:?}", parent))?;
        }
        let json = serde_json::to_vec_pretty(snapshot).context("serializing snapshot")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp, self.path))?;
        Ok(())
    }

    /// Read the cached snapshot. `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<DonationSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path).with_context(|| format!("reading {:?}", self.path))?;
        let snapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing cached snapshot {:?}", self.path))?;
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_none() {
        let tmp = tempdir().unwrap();
        let cache = SnapshotCache::new(tmp.path().join("none.json"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn survives_restart() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("snapshot.json");
        let snap = DonationSnapshot {
            total_amount: 1250.5,
            donor_count: 3,
            donor_names: vec!["Al".into(), "Bo".into()],
            source_timestamp: Some(Utc::now()),
        };

        SnapshotCache::new(&path).save(&snap).unwrap();

        let reloaded = SnapshotCache::new(&path).load().unwrap().unwrap();
        assert_eq!(reloaded, snap);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn non_finite_total_is_not_cached() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("snapshot.json");
        let snap = DonationSnapshot {
            total_amount: f64::INFINITY,
            ..DonationSnapshot::zero()
        };
        assert!(SnapshotCache::new(&path).save(&snap).is_err());
        assert!(SnapshotCache::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("snapshot.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(SnapshotCache::new(&path).load().is_err());
    }
}
