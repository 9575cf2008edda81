use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the photo-reconciler crate.
#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Exiftool failed to start")]
    Exiftool(#[from] exiftool::ExifToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not build the HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // --- Batch-level errors ---
    #[error("Directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    // --- Per-file errors ---
    #[error("Filename timestamp is not a valid date: {0}")]
    DateParse(#[from] crate::time::DateParseError),

    #[error("Metadata access failed: {0}")]
    Metadata(#[from] crate::store::MetadataError),

    #[error("Content description failed: {0}")]
    Description(#[from] crate::describe::DescribeError),

    #[error("Image conversion failed: {0}")]
    Conversion(#[from] crate::convert::ConversionError),
}
