use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrichromeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Pyramid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Shifted channels share no common region")]
    NoOverlap,

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Cannot create result directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{} would overwrite the output of {}",
        .input.display(),
        .first.display()
    )]
    DuplicateOutput { input: PathBuf, first: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    #[error("{failed} of {total} files failed; see log for per-file diagnostics")]
    Batch { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, TrichromeError>;
