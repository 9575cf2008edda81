//! Running a reconciler over a whole collection.

use crate::ReconcilerError;
use crate::convert::DecodableCopy;
use crate::describe::DescriptionProvider;
use crate::files::MediaFile;
use crate::store::MetadataStore;
use crate::tags::ContentTagger;
use crate::time::{ToleranceWindow, reconcile_file};
use bon::bon;
use serde::Serialize;
use std::path::Path;

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Written,
    /// A write was warranted but suppressed by dry run.
    WouldWrite,
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFilenameTimestamp,
    ExtensionExcluded,
    AlreadyTagged,
}

/// Reported before each file is processed.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Zero-based position of `path` in the batch.
    pub index: usize,
    pub total: usize,
    pub path: &'a Path,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub written: usize,
    pub would_write: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, result: &Result<FileOutcome, ReconcilerError>) {
        match result {
            Ok(FileOutcome::Written) => self.written += 1,
            Ok(FileOutcome::WouldWrite) => self.would_write += 1,
            Ok(FileOutcome::Unchanged) => self.unchanged += 1,
            Ok(FileOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Drives the reconcilers over a list of files, one file at a time.
///
/// Every per-file error is logged and counted; it never stops the batch.
/// The store is owned for the lifetime of the reconciler, so its helper
/// process is shut down when the reconciler is dropped.
///
/// ```rust,no_run
/// # use photo_reconciler::{ExifToolStore, Reconciler, ReconcilerError};
/// # fn main() -> Result<(), ReconcilerError> {
/// let mut reconciler = Reconciler::builder()
///     .store(ExifToolStore::new(None)?)
///     .dry_run(true)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct Reconciler<S> {
    store: S,
    dry_run: bool,
    tolerance: ToleranceWindow,
}

#[bon]
impl<S: MetadataStore> Reconciler<S> {
    /// # Builder Arguments
    ///
    /// * `store` - Where metadata is read from and written to.
    /// * `dry_run` - (Default: `false`) Decide and log, but never write.
    /// * `tolerance` - (Default: 24 hours) Largest difference between filename and stored dates that is left alone.
    #[builder]
    pub fn new(
        store: S,
        #[builder(default)] dry_run: bool,
        #[builder(default)] tolerance: ToleranceWindow,
    ) -> Self {
        Self {
            store,
            dry_run,
            tolerance,
        }
    }

    /// Brings the Exif dates of every file in line with its filename.
    pub fn correct_dates(
        &mut self,
        files: &[MediaFile],
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            total: files.len(),
            ..BatchSummary::default()
        };
        for (index, file) in files.iter().enumerate() {
            on_progress(Progress {
                index,
                total: files.len(),
                path: &file.path,
            });
            let result = reconcile_file(&mut self.store, file, self.tolerance, self.dry_run);
            log_failure(file, &result, "Failed to correct date");
            summary.record(&result);
            tracing::info!("Processed {}/{} images", index + 1, files.len());
        }
        log_summary(&summary);
        summary
    }

    /// Fills in tags, headline and abstract for every file that lacks them.
    pub async fn tag_images<P: DescriptionProvider, C: DecodableCopy>(
        &mut self,
        files: &[MediaFile],
        tagger: &ContentTagger<P, C>,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            total: files.len(),
            ..BatchSummary::default()
        };
        for (index, file) in files.iter().enumerate() {
            on_progress(Progress {
                index,
                total: files.len(),
                path: &file.path,
            });
            let result = tagger.tag_file(&mut self.store, file, self.dry_run).await;
            log_failure(file, &result, "Failed to tag image");
            summary.record(&result);
            tracing::info!("Processed {}/{} images", index + 1, files.len());
        }
        log_summary(&summary);
        summary
    }

    /// Gives the store back, e.g. to inspect it after a batch.
    pub fn into_store(self) -> S {
        self.store
    }
}

fn log_failure(file: &MediaFile, result: &Result<FileOutcome, ReconcilerError>, message: &str) {
    if let Err(err) = result {
        let kind = match err {
            ReconcilerError::Description(e) if e.is_schema_violation() => "schema",
            ReconcilerError::Description(_) => "transport",
            ReconcilerError::Metadata(e) if e.is_read() => "metadata-read",
            ReconcilerError::Metadata(_) => "metadata-write",
            ReconcilerError::DateParse(_) => "date-parse",
            ReconcilerError::Conversion(_) => "conversion",
            _ => "other",
        };
        tracing::error!(path = %file.path.display(), kind, error = %err, "{message}");
    }
}

fn log_summary(summary: &BatchSummary) {
    tracing::info!(
        total = summary.total,
        written = summary.written,
        would_write = summary.would_write,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        failed = summary.failed,
        "Batch finished"
    );
}
