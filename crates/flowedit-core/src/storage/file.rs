//! File-based configuration store.

use super::{BoxFuture, ConfigStore, StoreError, StoreResult};
use crate::config::ConfigDocument;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Stores the configuration as a YAML file.
///
/// Each write goes to its own uniquely named temporary file in the target's
/// directory, which is then renamed over the target. Readers never see a
/// half-written document and concurrent saves do not share a temp file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store for `config.yaml` in the working directory.
    pub fn default_location() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl ConfigStore for FileStore {
    fn save(&self, document: &ConfigDocument) -> BoxFuture<'_, StoreResult<()>> {
        let yaml = document.to_yaml();
        let path = self.path.clone();
        let dir = self.directory().to_path_buf();

        Box::pin(async move {
            let yaml = yaml?;
            fs::create_dir_all(&dir).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            let mut temp = NamedTempFile::new_in(&dir).map_err(|e| {
                StoreError::Io(format!("Failed to create a temporary file in {}: {}", dir.display(), e))
            })?;
            temp.write_all(yaml.as_bytes()).map_err(|e| {
                StoreError::Io(format!("Failed to write {}: {}", temp.path().display(), e))
            })?;
            temp.persist(&path).map_err(|e| {
                StoreError::Io(format!("Failed to replace {}: {}", path.display(), e.error))
            })?;
            log::info!("Saved configuration to {}", path.display());
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'_, StoreResult<ConfigDocument>> {
        let path = self.path.clone();

        Box::pin(async move {
            if !path.exists() {
                return Err(StoreError::NotFound);
            }

            let yaml = fs::read_to_string(&path).map_err(|e| {
                StoreError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            let document = ConfigDocument::from_yaml(&yaml).map_err(|e| {
                StoreError::Parse(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            log::info!(
                "Loaded configuration from {} ({} regions, {} lines, {} doors)",
                path.display(),
                document.regions.len(),
                document.lines.len(),
                document.doors.len()
            );
            Ok(document)
        })
    }

    fn exists(&self) -> BoxFuture<'_, StoreResult<bool>> {
        let path = self.path.clone();
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoordPair, RegionEntry};
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn triangle_document() -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        doc.regions.insert(
            "region_1".to_string(),
            RegionEntry {
                points: vec![CoordPair(0.0, 0.0), CoordPair(100.0, 0.0), CoordPair(50.0, 100.0)],
            },
        );
        doc
    }

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));

        block_on(store.save(&triangle_document())).unwrap();
        let loaded = block_on(store.load()).unwrap();

        assert_eq!(loaded, triangle_document());
    }

    #[test]
    fn test_file_store_writes_parenthesized_pairs() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));

        block_on(store.save(&triangle_document())).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();

        assert!(text.contains("(50, 100)"));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(entries, ["config.yaml"]);
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));

        let result = block_on(store.load());
        assert!(matches!(result, Err(StoreError::NotFound)));
        assert!(!block_on(store.exists()).unwrap());
    }

    #[test]
    fn test_file_store_parse_error_is_distinct() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "regions: {}\nlines: {}\n").unwrap();
        let store = FileStore::new(path);

        let result = block_on(store.load());
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_file_store_overwrites_in_full() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));

        block_on(store.save(&triangle_document())).unwrap();
        block_on(store.save(&ConfigDocument::default())).unwrap();

        assert!(block_on(store.load()).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("config.yaml"));

        block_on(store.save(&triangle_document())).unwrap();
        assert!(block_on(store.exists()).unwrap());
    }

    #[test]
    fn test_file_store_concurrent_saves() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("config.yaml"));
        let doc = triangle_document();

        let failures: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut failures = 0;
                        for _ in 0..50 {
                            if block_on(store.save(&doc)).is_err() {
                                failures += 1;
                            }
                            match block_on(store.load()) {
                                Ok(loaded) if loaded == doc => {}
                                _ => failures += 1,
                            }
                        }
                        failures
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).sum()
        });

        assert_eq!(failures, 0);
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(entries, ["config.yaml"]);
    }
}
