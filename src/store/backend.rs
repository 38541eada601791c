use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::error::EqubResult;

/// Key-value persistence backend for the whole state document.
///
/// The document is always written as one unit; a backend must never leave
/// a torn state observable through `load`.
pub trait StorageBackend {
    /// Load the raw document, or `None` when nothing has been saved yet
    fn load(&self) -> EqubResult<Option<String>>;

    /// Atomically replace the stored document
    fn save(&self, document: &str) -> EqubResult<()>;
}

/// File-backed store. Writes go to a sibling temp file first and are
/// renamed into place, so a crash mid-write leaves the previous document
/// intact.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> EqubResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, document: &str) -> EqubResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;
        debug!("Persisted state document to {}", self.path.display());
        Ok(())
    }
}

/// In-memory backend for tests
#[derive(Default)]
pub struct MemoryBackend {
    document: Mutex<Option<String>>,
}

impl StorageBackend for MemoryBackend {
    fn load(&self) -> EqubResult<Option<String>> {
        Ok(self.document.lock().expect("backend lock poisoned").clone())
    }

    fn save(&self, document: &str) -> EqubResult<()> {
        *self.document.lock().expect("backend lock poisoned") = Some(document.to_string());
        Ok(())
    }
}
