//! In-memory collaborators for unit tests.

use crate::convert::{ConversionError, DecodableCopy, DecodableImage};
use crate::describe::{DescribeError, DescriptionProvider};
use crate::store::{Field, FieldValue, FieldValues, MetadataError, MetadataStore, MetadataWriteIntent};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A [`MetadataStore`] keeping fields per path in a map. Writes are applied like exiftool does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<PathBuf, HashMap<Field, FieldValue>>,
    reads: usize,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl PartialEq for MemoryStore {
    /// Compares stored metadata only, not the call counters.
    fn eq(&self, other: &Self) -> bool {
        self.files == other.files
    }
}

impl MemoryStore {
    pub fn with_text(mut self, path: impl AsRef<Path>, field: Field, value: &str) -> Self {
        self.set(path.as_ref(), field, FieldValue::Text(value.to_string()));
        self
    }

    pub fn with_list(mut self, path: impl AsRef<Path>, field: Field, values: &[&str]) -> Self {
        let values = values.iter().map(|v| (*v).to_string()).collect();
        self.set(path.as_ref(), field, FieldValue::List(values));
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn value(&self, path: &Path, field: Field) -> Option<&FieldValue> {
        self.files.get(path).and_then(|fields| fields.get(&field))
    }

    pub fn read_count(&self) -> usize {
        self.reads
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn set(&mut self, path: &Path, field: Field, value: FieldValue) {
        self.files
            .entry(path.to_path_buf())
            .or_default()
            .insert(field, value);
    }
}

impl MetadataStore for MemoryStore {
    fn read_fields(&mut self, path: &Path, fields: &[Field]) -> Result<FieldValues, MetadataError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(MetadataError::InvalidValue {
                field: "File:FileType",
                value: "corrupt".to_string(),
            });
        }
        let stored = self.files.get(path);
        Ok(fields
            .iter()
            .filter_map(|&field| {
                let value = stored?.get(&field)?;
                Some((field, value.clone()))
            })
            .collect())
    }

    fn write_fields(&mut self, path: &Path, intent: &MetadataWriteIntent) -> Result<(), MetadataError> {
        if self.fail_writes {
            return Err(MetadataError::Rejected(
                "1 files weren't updated due to errors".to_string(),
            ));
        }
        self.writes += 1;
        for (field, value) in intent.iter() {
            self.set(path, *field, value.clone());
        }
        Ok(())
    }
}

/// A [`DescriptionProvider`] returning a fixed reply and recording what it was sent.
#[derive(Debug)]
pub struct ScriptedProvider {
    reply: Option<String>,
    calls: Cell<usize>,
    last_image: RefCell<Option<Vec<u8>>>,
}

impl ScriptedProvider {
    pub const MODEL: &'static str = "test-model";

    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Cell::new(0),
            last_image: RefCell::new(None),
        }
    }

    /// Every call fails as if the server were unavailable.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Cell::new(0),
            last_image: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_image(&self) -> Option<Vec<u8>> {
        self.last_image.borrow().clone()
    }
}

impl DescriptionProvider for ScriptedProvider {
    fn model(&self) -> &str {
        Self::MODEL
    }

    async fn describe(
        &self,
        image: &[u8],
        _instruction: &str,
        _schema: &Value,
    ) -> Result<String, DescribeError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_image.borrow_mut() = Some(image.to_vec());
        self.reply.clone().ok_or(DescribeError::Api {
            status: 503,
            body: "model is loading".to_string(),
        })
    }
}

/// A [`DecodableCopy`] writing fixed bytes to a temporary JPEG.
#[derive(Debug, Default)]
pub struct FakeConverter {
    fail: bool,
    converted: RefCell<Vec<PathBuf>>,
}

impl FakeConverter {
    pub const JPEG_BYTES: &'static [u8] = b"converted jpeg";

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn converted(&self) -> Vec<PathBuf> {
        self.converted.borrow().clone()
    }
}

impl DecodableCopy for FakeConverter {
    fn to_decodable(&self, path: &Path) -> Result<DecodableImage, ConversionError> {
        if self.fail {
            return Err(ConversionError::Failed {
                program: "heif-convert".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Could not decode HEIF/AVIF file".to_string(),
            });
        }
        self.converted.borrow_mut().push(path.to_path_buf());
        let temp = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .map_err(ConversionError::TempFile)?;
        std::fs::write(temp.path(), Self::JPEG_BYTES).map_err(ConversionError::TempFile)?;
        Ok(DecodableImage::Converted(temp))
    }
}
