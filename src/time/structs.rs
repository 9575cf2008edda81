use super::filename_parsing::FilenamePattern;
use super::parsing::{format_exif_datetime, is_placeholder_datetime, parse_exif_datetime};
use crate::store::{Field, FieldValues, MetadataError, MetadataWriteIntent};
use chrono::NaiveDateTime;

/// A capture time recovered from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameTimestampCandidate {
    pub datetime: NaiveDateTime,
    pub pattern: FilenamePattern,
}

/// The Exif date triad as currently stored in a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExistingTimestamps {
    pub original: Option<NaiveDateTime>,
    pub create: Option<NaiveDateTime>,
    pub modify: Option<NaiveDateTime>,
}

impl ExistingTimestamps {
    /// Parses the triad from store values. Missing tags and all-zero placeholders
    /// become `None`; any other unparseable value is an error.
    pub fn from_fields(values: &FieldValues) -> Result<Self, MetadataError> {
        Ok(Self {
            original: parse_field(values, Field::DateTimeOriginal)?,
            create: parse_field(values, Field::CreateDate)?,
            modify: parse_field(values, Field::ModifyDate)?,
        })
    }
}

fn parse_field(values: &FieldValues, field: Field) -> Result<Option<NaiveDateTime>, MetadataError> {
    let Some(raw) = values.text(field) else {
        return Ok(None);
    };
    if is_placeholder_datetime(raw) {
        return Ok(None);
    }
    parse_exif_datetime(raw)
        .map(Some)
        .ok_or_else(|| MetadataError::InvalidValue {
            field: field.write_tag(),
            value: raw.to_string(),
        })
}

/// What to do with a file's date triad for one filename candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampDecision {
    /// Stored dates agree with the filename.
    Keep,
    /// No trustworthy date is stored: all three fields get the candidate.
    Fill(NaiveDateTime),
    /// The stored dates drifted: the original date gets the candidate while
    /// create and modify get the previous original date.
    // TODO: confirm with the product owner whether create/modify should get the candidate instead.
    Correct {
        candidate: NaiveDateTime,
        previous_original: NaiveDateTime,
    },
}

impl TimestampDecision {
    /// The write this decision calls for. Always all three date fields, or nothing.
    pub fn intent(&self) -> Option<MetadataWriteIntent> {
        let (original, create_and_modify) = match *self {
            Self::Keep => return None,
            Self::Fill(candidate) => (candidate, candidate),
            Self::Correct {
                candidate,
                previous_original,
            } => (candidate, previous_original),
        };
        let create_and_modify = format_exif_datetime(create_and_modify);
        Some(
            MetadataWriteIntent::new()
                .set_text(Field::DateTimeOriginal, format_exif_datetime(original))
                .set_text(Field::CreateDate, create_and_modify.clone())
                .set_text(Field::ModifyDate, create_and_modify),
        )
    }
}
