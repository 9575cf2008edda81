use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Could not read metadata: {0}")]
    Read(#[source] exiftool::ExifToolError),

    #[error("Unreadable value {value:?} in {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Could not write metadata: {0}")]
    Write(#[source] exiftool::ExifToolError),

    #[error("Exiftool did not update the file: {0}")]
    Rejected(String),
}

impl MetadataError {
    /// Whether the failure happened while reading (as opposed to writing) metadata.
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Read(_) | Self::InvalidValue { .. })
    }
}
