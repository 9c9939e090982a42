//! On-disk tile store.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use crate::retrieve::{RetrievalError, RetrievalPostProcessor};

/// Maps tile cache paths into a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a relative cache path.
    pub fn path_for(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Path of an existing file, if present.
    pub fn find(&self, relative: &str) -> Option<PathBuf> {
        let path = self.path_for(relative);
        path.is_file().then_some(path)
    }

    /// `file://` URL of an existing file, if present.
    pub fn find_url(&self, relative: &str) -> Option<Url> {
        self.find(relative)
            .and_then(|path| std::fs::canonicalize(path).ok())
            .and_then(|path| Url::from_file_path(path).ok())
    }

    /// Write `data` by way of a temporary sibling and a rename, so readers
    /// never observe a partial file.
    pub fn write_atomic(&self, relative: &str, data: &[u8]) -> io::Result<PathBuf> {
        static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

        let path = self.path_for(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp = path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let result = std::fs::File::create(&temp)
            .and_then(|mut file| {
                file.write_all(data)?;
                file.sync_all()
            })
            .and_then(|_| std::fs::rename(&temp, &path));

        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }

        debug!(path = %path.display(), bytes = data.len(), "Stored tile file");
        Ok(path)
    }

    /// Delete a stored file. Missing files are not an error.
    pub fn remove(&self, relative: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path_for(relative)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Post-processor that saves retrieved bytes into a [`FileStore`].
#[derive(Debug, Clone)]
pub struct SaveToFileProcessor {
    store: FileStore,
    relative: String,
}

impl SaveToFileProcessor {
    pub fn new(store: FileStore, relative: impl Into<String>) -> Self {
        Self {
            store,
            relative: relative.into(),
        }
    }
}

impl RetrievalPostProcessor for SaveToFileProcessor {
    fn process(&self, data: Bytes, _content_type: Option<&str>) -> Result<Bytes, RetrievalError> {
        match self.store.write_atomic(&self.relative, &data) {
            Ok(_) => Ok(data),
            Err(e) => {
                warn!(path = %self.relative, error = %e, "Failed to save retrieved tile");
                Err(RetrievalError::Save {
                    path: self.store.path_for(&self.relative).display().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.find("bmng/0/1/1_2.png").is_none());

        let path = store.write_atomic("bmng/0/1/1_2.png", b"tile").unwrap();
        assert_eq!(path, dir.path().join("bmng/0/1/1_2.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"tile");
        assert_eq!(store.find("bmng/0/1/1_2.png"), Some(path));

        let url = store.find_url("bmng/0/1/1_2.png").unwrap();
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn test_no_temp_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write_atomic("a/b.png", b"1").unwrap();
        store.write_atomic("a/b.png", b"2").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path().join("a"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["b.png"]);
        assert_eq!(std::fs::read(store.path_for("a/b.png")).unwrap(), b"2");
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.remove("nothing/here.png").is_ok());
    }

    #[test]
    fn test_save_processor() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let processor = SaveToFileProcessor::new(store.clone(), "x/0/0/0_0.png");

        let data = processor
            .process(Bytes::from_static(b"payload"), Some("image/png"))
            .unwrap();
        assert_eq!(&data[..], b"payload");
        assert!(store.find("x/0/0/0_0.png").is_some());
    }
}
