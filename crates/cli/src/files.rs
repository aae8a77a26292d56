//! JSON file-backed collaborators for local batch runs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fire_events_core::gateway::matches_query;
use fire_events_core::{
    AdminRegion, DateWindow, Detection, DetectionSource, EventStore, FootprintRow,
    PipelineConfig, SourceError, StoreError,
};
use geo::Rect;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

/// Failure loading an input file
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FileError> {
    let contents = fs::read_to_string(path).map_err(|e| FileError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&contents).map_err(|e| FileError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Pipeline configuration from a JSON file; missing fields keep defaults
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_config(path: &Path) -> Result<PipelineConfig, FileError> {
    read_json(path)
}

/// Administrative regions from a JSON array, in file order
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn load_regions(path: &Path) -> Result<Vec<AdminRegion>, FileError> {
    read_json(path)
}

/// Detection source reading a JSON array of projected detections
#[derive(Debug, Clone)]
pub struct JsonDetectionFile {
    path: PathBuf,
}

impl JsonDetectionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DetectionSource for JsonDetectionFile {
    fn fetch(&self, window: DateWindow, bbox: Rect<f64>) -> Result<Vec<Detection>, SourceError> {
        let all: Vec<Detection> = read_json(&self.path).map_err(|e| match e {
            FileError::Read { .. } => SourceError::Fetch(e.to_string()),
            FileError::Parse { .. } => SourceError::Parse(e.to_string()),
        })?;

        let total = all.len();
        let selected: Vec<Detection> = all
            .into_iter()
            .filter(|d| matches_query(d, window, &bbox))
            .collect();
        debug!(path = %self.path.display(), total, selected = selected.len(), "read detection file");
        Ok(selected)
    }
}

/// Event store persisted as a JSON array of rows
///
/// A missing file is an empty store; it is created on first insert.
#[derive(Debug)]
pub struct JsonEventStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Every stored row
    ///
    /// # Errors
    /// Returns error if an existing file cannot be read or parsed
    pub fn load(&self) -> Result<Vec<FootprintRow>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Read(format!("{}: {e}", self.path.display()))),
        };

        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Read(format!("{}: {e}", self.path.display())))
    }
}

impl EventStore for JsonEventStore {
    fn existing_event_ids(&self) -> Result<FxHashSet<u32>, StoreError> {
        Ok(self.load()?.iter().map(|r| r.event_id).collect())
    }

    fn insert(&self, rows: &[FootprintRow]) -> Result<(), StoreError> {
        let _lock = self.write_lock.lock().map_err(|e| StoreError::Write(e.to_string()))?;

        let mut stored = self.load()?;
        stored.extend_from_slice(rows);

        let contents = serde_json::to_string_pretty(&stored)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        fs::write(&self.path, contents)
            .map_err(|e| StoreError::Write(format!("{}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), inserted = rows.len(), total = stored.len(), "wrote event store");
        Ok(())
    }
}
