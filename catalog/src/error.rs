use std::path::PathBuf;

/// Errors raised while loading, patching, or writing a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("action not found in catalog: {0}")]
    MissingAction(String),
    #[error("action {action} has no parameter at index {index}")]
    MissingParameter { action: String, index: usize },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
