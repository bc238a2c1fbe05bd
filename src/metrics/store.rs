/// File-backed persistence for the metrics catalog.
///
/// The whole catalog lives in one JSON file (default `~/.ola/metrics.json`)
/// that is read once at startup and overwritten wholesale after every
/// mutation. All I/O is best-effort: a missing or malformed file loads as an
/// empty catalog, and a failed write is logged and otherwise ignored, so the
/// in-memory stats stay correct for the session even when the disk is not.
///
/// The last I/O outcome is kept in a degraded flag that the health surfaces
/// report.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::stats::MetricsCatalog;
use crate::config::schema::MetricsConfig;

pub struct StatsStore {
    path: Option<PathBuf>,
    degraded: bool,
}

impl StatsStore {
    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            degraded: false,
        }
    }

    /// Store at `~/.ola/metrics.json`. If the home directory cannot be
    /// resolved the store is in-memory only and permanently degraded.
    pub fn default_location() -> Self {
        match default_store_path() {
            Some(path) => Self::at(path),
            None => Self {
                path: None,
                degraded: true,
            },
        }
    }

    /// Store at the configured path, falling back to the default location.
    pub fn from_config(config: &MetricsConfig) -> Self {
        match config.resolved_store_path() {
            Some(path) => Self::at(path),
            None => Self::default_location(),
        }
    }

    /// Read the catalog. Never fails: absence or corruption yields an empty
    /// catalog.
    pub fn load(&mut self) -> MetricsCatalog {
        let Some(path) = self.path.as_deref() else {
            return MetricsCatalog::new();
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no metrics file yet");
                return MetricsCatalog::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "metrics store unreadable");
                self.degraded = true;
                return MetricsCatalog::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "metrics file malformed, starting empty");
                MetricsCatalog::new()
            }
        }
    }

    /// Overwrite the file with `catalog`. Failures are logged, not retried.
    pub fn save(&mut self, catalog: &MetricsCatalog) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        match write_catalog(path, catalog) {
            Ok(()) => self.degraded = false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to persist metrics");
                self.degraded = true;
            }
        }
    }

    /// Clear every entry, persist the empty catalog, and return it.
    pub fn reset(&mut self, mut catalog: MetricsCatalog) -> MetricsCatalog {
        catalog.clear();
        self.save(&catalog);
        catalog
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the last read or write against the backing file failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

fn write_catalog(path: &Path, catalog: &MetricsCatalog) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(catalog)?;
    fs::write(path, json)?;
    Ok(())
}

/// Default location of the metrics file: `~/.ola/metrics.json`.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ola").join("metrics.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty_without_degrading() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StatsStore::at(dir.path().join("metrics.json"));
        assert!(store.load().is_empty());
        assert!(!store.is_degraded());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, "{ not json").unwrap();
        let mut store = StatsStore::at(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("metrics.json");
        let mut store = StatsStore::at(&path);

        let mut catalog = MetricsCatalog::new();
        catalog.entry("m1").push_sample(0.5, 4.0, 10);
        catalog.entry("m1").push_vote(true);
        store.save(&catalog);
        assert!(path.exists());

        let loaded = StatsStore::at(&path).load();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn reset_persists_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let mut store = StatsStore::at(&path);

        let mut catalog = MetricsCatalog::new();
        catalog.entry("m1").push_vote(false);
        store.save(&catalog);

        let catalog = store.reset(catalog);
        assert!(catalog.is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn unwritable_path_marks_store_degraded() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut store = StatsStore::at(blocker.join("metrics.json"));

        let mut catalog = MetricsCatalog::new();
        catalog.entry("m1").push_vote(true);
        store.save(&catalog);
        assert!(store.is_degraded());
        assert_eq!(catalog.len(), 1);
    }
}
