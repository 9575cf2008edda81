//! # Photo Reconciler
//!
//! Keep photo metadata consistent with what the files themselves tell us.
//!
//! This crate walks a photo collection and reconciles two kinds of metadata:
//!
//! - **Capture time**: a timestamp encoded in the filename (for example
//!   `23-05-24 14-30-05 trip.jpg` or `IMG_20230601_081500.heic`) is treated as
//!   the ground truth for when the photo was taken. Missing Exif dates are filled
//!   in, and dates that drifted more than 24 hours away are corrected.
//! - **Descriptive metadata**: images without keywords get tags (English and
//!   German), a headline and an abstract from a vision model behind an
//!   OpenAI-compatible API, written to both the IPTC and the XMP tags.
//!
//! All metadata I/O goes through [`exiftool`](https://exiftool.org/).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use photo_reconciler::{ExifToolStore, Reconciler, ReconcilerError, files};
//!
//! fn main() -> Result<(), ReconcilerError> {
//!     let files = files::enumerate(Path::new("photos"), false)?;
//!     let store = ExifToolStore::new(None)?;
//!     let mut reconciler = Reconciler::builder().store(store).build();
//!
//!     let summary = reconciler.correct_dates(&files, |_| {});
//!     println!("{} files written", summary.written);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod convert;
pub mod describe;
mod error;
pub mod files;
pub mod store;
pub mod tags;
#[cfg(test)]
mod testing;
pub mod time;

pub use batch::{BatchSummary, FileOutcome, Progress, Reconciler};
pub use convert::{CommandConverter, DecodableCopy};
pub use describe::{DescriptionProvider, OpenAiProvider};
pub use error::ReconcilerError;
pub use files::{ImageExtension, MediaFile};
pub use store::{ExifToolStore, Field, FieldValue, MetadataStore, MetadataWriteIntent};
pub use tags::ContentTagger;
