//! Producing a JPEG the vision model can read from formats it cannot.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Could not create a temporary file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// An image path that is safe to decode, plus the temporary file backing it, if any.
///
/// The temporary file is deleted when this value is dropped.
#[derive(Debug)]
pub enum DecodableImage {
    Original(PathBuf),
    Converted(NamedTempFile),
}

impl DecodableImage {
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(path) => path,
            Self::Converted(temp) => temp.path(),
        }
    }
}

/// Turns a file in a format that cannot be decoded directly into a temporary JPEG.
pub trait DecodableCopy {
    fn to_decodable(&self, path: &Path) -> Result<DecodableImage, ConversionError>;
}

/// [`DecodableCopy`] that shells out to `<program> <input> <output.jpg>`.
///
/// This calling form fits both `heif-convert` (libheif) and ImageMagick's `magick`.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    pub const DEFAULT_PROGRAM: &'static str = "heif-convert";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl DecodableCopy for CommandConverter {
    fn to_decodable(&self, path: &Path) -> Result<DecodableImage, ConversionError> {
        tracing::info!(path = %path.display(), program = %self.program, "Converting to temporary JPEG");
        let temp = tempfile::Builder::new()
            .prefix("photo-reconciler-")
            .suffix(".jpg")
            .tempfile()
            .map_err(ConversionError::TempFile)?;

        let output = Command::new(&self.program)
            .arg(path)
            .arg(temp.path())
            .output()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConversionError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(DecodableImage::Converted(temp))
    }
}
