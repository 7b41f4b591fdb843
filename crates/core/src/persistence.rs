//! Annotation persistence
//!
//! Persistence is best-effort: the resolver and positioning code never see
//! storage errors. [`load_or_default`] and [`save_best_effort`] are the
//! boundary where failures are logged and swallowed.

use crate::annotation::Annotation;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key used when none is given
pub const DEFAULT_STORAGE_KEY: &str = "pdf-annotations";

const ANNOTATIONS_SCHEMA_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported annotation schema version {0}")]
    UnsupportedVersion(u32),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Stores and restores the full annotation list
pub trait AnnotationSink {
    /// Previously stored list; empty when nothing was stored
    fn load(&self) -> PersistenceResult<Vec<Annotation>>;

    /// Replace the stored list
    fn save(&self, annotations: &[Annotation]) -> PersistenceResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct AnnotationsEnvelope {
    version: u32,
    annotations: Vec<Annotation>,
}

fn encode(annotations: &[Annotation]) -> PersistenceResult<String> {
    let envelope = AnnotationsEnvelope {
        version: ANNOTATIONS_SCHEMA_VERSION,
        annotations: annotations.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

fn decode(json: &str) -> PersistenceResult<Vec<Annotation>> {
    let envelope: AnnotationsEnvelope = serde_json::from_str(json)?;
    if envelope.version != ANNOTATIONS_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.annotations)
}

/// JSON file in a data directory, one file per storage key
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    root: PathBuf,
    key: String,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            key: key.into(),
        }
    }

    /// Sink under the platform data directory
    ///
    /// - macOS: ~/Library/Application Support/pdf-annotator
    /// - Linux: ~/.local/share/pdf-annotator
    /// - Windows: %APPDATA%\pdf-annotator
    pub fn in_data_dir(key: impl Into<String>) -> PersistenceResult<Self> {
        let root = dirs::data_dir().ok_or(PersistenceError::NoDataDirectory)?;
        Ok(Self::new(root.join("pdf-annotator"), key))
    }

    /// Sidecar sink next to a document: `<document>.annotations.json`
    pub fn sidecar(document_path: &Path) -> Self {
        let root = document_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let file_name = document_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        Self::new(root, format!("{}.annotations", file_name))
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.key))
    }
}

impl AnnotationSink for JsonFileSink {
    fn load(&self) -> PersistenceResult<Vec<Annotation>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        decode(&fs::read_to_string(path)?)
    }

    fn save(&self, annotations: &[Annotation]) -> PersistenceResult<()> {
        fs::create_dir_all(&self.root)?;
        let json = encode(annotations)?;

        // Write through a temporary file so readers never see a partial list
        let path = self.path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

/// In-memory key/value sink
#[derive(Debug, Default)]
pub struct MemorySink {
    key: String,
    slots: RefCell<HashMap<String, String>>,
}

impl MemorySink {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Raw stored value, as a browser storage slot would hold it
    pub fn raw(&self) -> Option<String> {
        self.slots.borrow().get(&self.key).cloned()
    }

    pub fn set_raw(&self, value: impl Into<String>) {
        self.slots
            .borrow_mut()
            .insert(self.key.clone(), value.into());
    }
}

impl AnnotationSink for MemorySink {
    fn load(&self) -> PersistenceResult<Vec<Annotation>> {
        match self.raw() {
            Some(json) => decode(&json),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, annotations: &[Annotation]) -> PersistenceResult<()> {
        let json = encode(annotations)?;
        self.set_raw(json);
        Ok(())
    }
}

/// Load, treating any failure as "no saved state"
pub fn load_or_default(sink: &dyn AnnotationSink) -> Vec<Annotation> {
    match sink.load() {
        Ok(annotations) => annotations,
        Err(err) => {
            log::warn!("failed to load annotations, starting empty: {}", err);
            Vec::new()
        }
    }
}

/// Save, logging and skipping on failure. Returns whether the save happened.
pub fn save_best_effort(sink: &dyn AnnotationSink, annotations: &[Annotation]) -> bool {
    match sink.save(annotations) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("failed to save {} annotations: {}", annotations.len(), err);
            false
        }
    }
}
