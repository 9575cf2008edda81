//! Reading and writing the metadata fields the reconcilers care about.
mod error;
mod exiftool_store;

pub use exiftool_store::ExifToolStore;
pub use error::MetadataError;

use std::collections::HashMap;
use std::path::Path;

/// A metadata tag this crate reads or writes.
///
/// Several fields are aliases of each other across the Exif, IPTC and XMP
/// standards. Both aliases are always written so every downstream consumer
/// finds the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DateTimeOriginal,
    CreateDate,
    ModifyDate,
    Subject,
    Keywords,
    WriterEditor,
    Headline,
    Title,
    ImageDescription,
    CaptionAbstract,
    Description,
}

impl Field {
    /// Tag name used when assigning a value.
    pub const fn write_tag(self) -> &'static str {
        match self {
            Self::DateTimeOriginal => "EXIF:DateTimeOriginal",
            Self::CreateDate => "EXIF:CreateDate",
            Self::ModifyDate => "EXIF:ModifyDate",
            Self::Subject => "XMP-dc:Subject",
            Self::Keywords => "IPTC:Keywords",
            Self::WriterEditor => "IPTC:Writer-Editor",
            Self::Headline => "IPTC:Headline",
            Self::Title => "XMP-dc:Title",
            Self::ImageDescription => "EXIF:ImageDescription",
            Self::CaptionAbstract => "IPTC:Caption-Abstract",
            Self::Description => "XMP-dc:Description",
        }
    }

    pub fn is_iptc(self) -> bool {
        self.write_tag().starts_with("IPTC:")
    }

    /// Key under which the value shows up when reading with family 0 groups (`-G`).
    pub const fn read_key(self) -> &'static str {
        match self {
            Self::Subject => "XMP:Subject",
            Self::Title => "XMP:Title",
            Self::Description => "XMP:Description",
            other => other.write_tag(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// True unless the value is an empty string or an empty list.
    pub fn is_populated(&self) -> bool {
        match self {
            Self::Text(text) => !text.trim().is_empty(),
            Self::List(items) => items.iter().any(|item| !item.trim().is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }
}

/// Current values of the requested fields. Fields the file does not carry are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(HashMap<Field, FieldValue>);

impl FieldValues {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn is_populated(&self, field: Field) -> bool {
        self.get(field).is_some_and(FieldValue::is_populated)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Field, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (Field, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything to persist for one file in one pass. Submitted in a single store call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataWriteIntent {
    fields: Vec<(Field, FieldValue)>,
}

impl MetadataWriteIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field`, replacing an earlier value for the same field.
    pub fn set(mut self, field: Field, value: FieldValue) -> Self {
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn set_text(self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Text(value.into()))
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Field, FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read/write access to the structured metadata embedded in image files.
///
/// Implementations must report failures to the caller; a write either applies
/// the whole intent or returns an error.
pub trait MetadataStore {
    fn read_fields(&mut self, path: &Path, fields: &[Field]) -> Result<FieldValues, MetadataError>;

    fn write_fields(&mut self, path: &Path, intent: &MetadataWriteIntent) -> Result<(), MetadataError>;
}
