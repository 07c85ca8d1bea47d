use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::object::DocumentObject;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a WikiDom JSON file into the nested-object form
pub fn read_document(path: &Path) -> Result<DocumentObject, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a document in the nested-object form as pretty-printed JSON
pub fn write_document(path: &Path, document: &DocumentObject) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(document)?;
    fs::write(path, text)?;
    Ok(())
}
