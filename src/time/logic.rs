//! Deciding whether a file's Exif dates need to follow its filename.

use super::filename_parsing::parse_filename_candidates;
use super::structs::{ExistingTimestamps, TimestampDecision};
use super::tolerance::ToleranceWindow;
use crate::batch::{FileOutcome, SkipReason};
use crate::files::{ImageExtension, MediaFile};
use crate::store::{Field, MetadataStore};
use crate::ReconcilerError;
use chrono::NaiveDateTime;

/// The date triad, always read and written together.
pub const TIMESTAMP_FIELDS: [Field; 3] = [Field::DateTimeOriginal, Field::CreateDate, Field::ModifyDate];

/// Filename timestamps are only trusted for these formats.
const PATTERN_EXTENSIONS: [ImageExtension; 2] = [ImageExtension::Jpg, ImageExtension::Heic];

/// Compares a filename candidate with the stored dates.
///
/// A missing original or create date means nothing stored can be trusted, so the
/// candidate is filled in without looking at tolerances. Otherwise the candidate is
/// checked against both dates and a conflict with either triggers a correction.
pub fn decide(
    candidate: NaiveDateTime,
    existing: &ExistingTimestamps,
    window: ToleranceWindow,
) -> TimestampDecision {
    let (Some(original), Some(create)) = (existing.original, existing.create) else {
        return TimestampDecision::Fill(candidate);
    };

    if window.conflicts(candidate, original) || window.conflicts(candidate, create) {
        TimestampDecision::Correct {
            candidate,
            previous_original: original,
        }
    } else {
        TimestampDecision::Keep
    }
}

/// Reconciles the dates of one file with every timestamp found in its name.
///
/// Candidates are handled in pattern order and each one re-reads the store, so a
/// second candidate sees what the first one wrote. With `dry_run` nothing is written.
///
/// # Errors
///
/// * [`ReconcilerError::DateParse`] if a matched pattern is not a valid date/time.
/// * [`ReconcilerError::Metadata`] if reading, parsing or writing the dates fails.
pub fn reconcile_file<S: MetadataStore>(
    store: &mut S,
    file: &MediaFile,
    window: ToleranceWindow,
    dry_run: bool,
) -> Result<FileOutcome, ReconcilerError> {
    let path = file.path.display();
    if !PATTERN_EXTENSIONS.contains(&file.extension) {
        tracing::debug!(path = %path, "Extension not checked for filename timestamps");
        return Ok(FileOutcome::Skipped(SkipReason::ExtensionExcluded));
    }

    let candidates = parse_filename_candidates(&file.file_name());
    if candidates.is_empty() {
        tracing::debug!(path = %path, "No date pattern matched");
        return Ok(FileOutcome::Skipped(SkipReason::NoFilenameTimestamp));
    }

    let mut outcome = FileOutcome::Unchanged;
    for candidate in candidates {
        let candidate = candidate?;
        tracing::debug!(path = %path, pattern = ?candidate.pattern, candidate = %candidate.datetime, "Matched date pattern");

        let values = store.read_fields(&file.path, &TIMESTAMP_FIELDS)?;
        let existing = ExistingTimestamps::from_fields(&values)?;
        let decision = decide(candidate.datetime, &existing, window);

        let Some(intent) = decision.intent() else {
            tracing::debug!(path = %path, original = ?existing.original, "Date already correct");
            continue;
        };
        match decision {
            TimestampDecision::Fill(date) => {
                tracing::info!(path = %path, date = %date, "No original or create date, setting all dates");
            }
            TimestampDecision::Correct {
                candidate,
                previous_original,
            } => {
                tracing::info!(
                    path = %path,
                    from = %previous_original,
                    to = %candidate,
                    "Date differs more than the tolerance window, updating original date"
                );
            }
            TimestampDecision::Keep => {}
        }

        if dry_run {
            tracing::info!(path = %path, "Dry run, not writing dates");
            outcome = FileOutcome::WouldWrite;
        } else {
            store.write_fields(&file.path, &intent)?;
            outcome = FileOutcome::Written;
        }
    }
    Ok(outcome)
}
