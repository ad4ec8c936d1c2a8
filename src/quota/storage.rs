//! Durable Record Storage
//!
//! Where the quota record lives between runs. Anything that can load and save
//! one record satisfies [`RecordStore`].

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{GovernorError, Result};
use crate::quota::QuotaRecord;

/// Durable slot holding a single quota record.
pub trait RecordStore: Send + Sync + Debug {
    /// Returns the stored record, `None` when nothing has been saved yet.
    /// Unreadable or malformed content is an error.
    fn load(&self) -> Result<Option<QuotaRecord>>;

    /// Replaces the stored record.
    fn save(&self, record: &QuotaRecord) -> Result<()>;
}

// == File Store ==
/// Keeps the record as a JSON file.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sibling file a save is staged in before it replaces the record.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for FileRecordStore {
    fn load(&self) -> Result<Option<QuotaRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    fn save(&self, record: &QuotaRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write then rename so a crash never leaves a truncated record.
        let json = serde_json::to_string_pretty(record)?;
        let staging = self.staging_path();
        fs::write(&staging, json)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

// == Memory Store ==
/// Keeps the serialized record in memory. Useful for tests and for runs that
/// should not touch the disk.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    raw: Mutex<Option<String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with arbitrary stored text, well-formed or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// Current stored text.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&self) -> Result<Option<QuotaRecord>> {
        let raw = self.raw.lock().map_err(|_| {
            GovernorError::Persistence("memory record store lock poisoned".to_string())
        })?;

        match raw.as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, record: &QuotaRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut raw = self.raw.lock().map_err(|_| {
            GovernorError::Persistence("memory record store lock poisoned".to_string())
        })?;
        *raw = Some(json);
        Ok(())
    }
}
