//! Finding the images to reconcile.

use crate::ReconcilerError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// The image formats this crate knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Heic,
}

impl ImageExtension {
    /// Matches an extension case-insensitively, without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "heic" => Some(Self::Heic),
            _ => None,
        }
    }

    /// Whether the file can be handed to the vision model as-is.
    /// HEIC has to go through a JPEG copy first.
    pub const fn is_directly_decodable(self) -> bool {
        !matches!(self, Self::Heic)
    }
}

/// One image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub extension: ImageExtension,
}

impl MediaFile {
    /// Returns `None` if the path does not carry a supported image extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageExtension::from_extension)?;
        Some(Self { path, extension })
    }

    /// The basename, lossily converted. Filename patterns are matched against this.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Checks if a directory entry is hidden (starts with '.').
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Recursively lists all supported images below `root`.
///
/// Entries are visited in file name order, so two runs over an unchanged tree
/// yield the same sequence. The root itself is never filtered as hidden.
///
/// # Errors
///
/// * [`ReconcilerError::RootNotFound`] if `root` is not an existing directory.
/// * [`ReconcilerError::Walk`] if reading any entry fails during traversal.
pub fn enumerate(root: &Path, include_hidden: bool) -> Result<Vec<MediaFile>, ReconcilerError> {
    if !root.is_dir() {
        return Err(ReconcilerError::RootNotFound(root.to_path_buf()));
    }
    tracing::info!(root = %root.display(), "Scanning directory");

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(file) = MediaFile::from_path(entry.path()) {
            files.push(file);
        }
    }

    tracing::debug!(count = files.len(), "Found image files");
    Ok(files)
}
