use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading inputs or writing overlays.
///
/// Building a sequence never fails; a frame without a program yields an empty
/// [`Sequence`](crate::sequence::Sequence) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid detections JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
