// error.rs — 错误分类

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// Every variant of an asset fallback chain failed.
    #[error("asset not found: {kind} (tried {tried:?})")]
    AssetNotFound { kind: &'static str, tried: Vec<PathBuf> },

    #[error("scene `{0}` is not in the manifest")]
    SceneNotFound(String),

    #[error("failed to load manifest {path}: {reason}")]
    ManifestLoad { path: PathBuf, reason: String },

    /// A hotspot record with neither `position` nor `uv` + `d`, or one that does not parse.
    #[error("hotspot record #{index} ({id}) skipped: {reason}")]
    MalformedHotspot {
        index: usize,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
