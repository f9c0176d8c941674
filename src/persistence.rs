use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::stroke::Stroke;

/// Format version written into every document
pub const DOCUMENT_VERSION: &str = "1";

/// Errors that can occur while saving or loading strokes
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize strokes: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write strokes: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to read stroke file: {0}")]
    Read(String),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// The stroke list as handed to note storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokeDocument {
    pub version: String,
    pub strokes: Vec<Stroke>,
}

impl StrokeDocument {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            strokes,
        }
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        if document.version != DOCUMENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(document.version));
        }
        Ok(document)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Saved {} strokes to {}", self.strokes.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| PersistenceError::Read(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}
