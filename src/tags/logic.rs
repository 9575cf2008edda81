use super::schema::{INSTRUCTION, description_schema, parse_description};
use super::structs::ContentDescription;
use crate::ReconcilerError;
use crate::batch::{FileOutcome, SkipReason};
use crate::convert::{DecodableCopy, DecodableImage};
use crate::describe::DescriptionProvider;
use crate::files::MediaFile;
use crate::store::{Field, FieldValue, FieldValues, MetadataStore, MetadataWriteIntent};
use bon::bon;

/// The two competing keyword tags. Either one being set means the image is tagged.
pub const ALIAS_FIELDS: [Field; 2] = [Field::Subject, Field::Keywords];

pub fn has_existing_tags(values: &FieldValues) -> bool {
    ALIAS_FIELDS.iter().any(|&field| values.is_populated(field))
}

/// Everything written for one description, mirrored into the IPTC, XMP and Exif aliases.
pub fn description_intent(description: &ContentDescription, model: &str) -> MetadataWriteIntent {
    MetadataWriteIntent::new()
        .set(Field::Keywords, FieldValue::List(description.tags.clone()))
        .set(Field::Subject, FieldValue::List(description.tags.clone()))
        .set_text(Field::WriterEditor, model)
        .set_text(Field::Headline, description.headline.as_str())
        .set_text(Field::Title, description.headline.as_str())
        .set_text(Field::ImageDescription, description.headline.as_str())
        .set_text(Field::CaptionAbstract, description.summary.as_str())
        .set_text(Field::Description, description.summary.as_str())
}

/// Derives descriptive metadata for untagged images from a [`DescriptionProvider`].
pub struct ContentTagger<P, C> {
    provider: P,
    converter: C,
    overwrite: bool,
}

#[bon]
impl<P: DescriptionProvider, C: DecodableCopy> ContentTagger<P, C> {
    /// # Builder Arguments
    ///
    /// * `provider` - Answers the description requests.
    /// * `converter` - Produces JPEG copies of HEIC files before they are sent.
    /// * `overwrite` - (Default: `false`) Describe images again even if they are already tagged.
    #[builder]
    pub fn new(provider: P, converter: C, #[builder(default)] overwrite: bool) -> Self {
        Self {
            provider,
            converter,
            overwrite,
        }
    }

    /// Ensures a single image carries tags, a headline and an abstract.
    ///
    /// Nothing is written unless a complete description was obtained. With
    /// `dry_run` the provider is still asked, but the result is only logged.
    ///
    /// # Errors
    ///
    /// * [`ReconcilerError::Metadata`] if the stored tags cannot be read or the update cannot be written.
    /// * [`ReconcilerError::Conversion`] if a HEIC file could not be turned into a JPEG.
    /// * [`ReconcilerError::Io`] if the image cannot be read.
    /// * [`ReconcilerError::Description`] if the provider fails or its reply does not match the schema.
    pub async fn tag_file<S: MetadataStore>(
        &self,
        store: &mut S,
        file: &MediaFile,
        dry_run: bool,
    ) -> Result<FileOutcome, ReconcilerError> {
        let path = file.path.display();
        let existing = store.read_fields(&file.path, &ALIAS_FIELDS)?;
        if !self.overwrite && has_existing_tags(&existing) {
            tracing::info!(path = %path, "Image already has tags, skipping");
            return Ok(FileOutcome::Skipped(SkipReason::AlreadyTagged));
        }

        let decodable = if file.extension.is_directly_decodable() {
            DecodableImage::Original(file.path.clone())
        } else {
            self.converter.to_decodable(&file.path)?
        };
        let image = tokio::fs::read(decodable.path()).await?;

        tracing::info!(path = %path, model = %self.provider.model(), "Describing image");
        let raw = self
            .provider
            .describe(&image, INSTRUCTION, &description_schema())
            .await?;
        let description = parse_description(&raw)?;
        tracing::debug!(path = %path, tags = ?description.tags, "Tags");
        tracing::debug!(path = %path, headline = %description.headline, "Headline");
        tracing::debug!(path = %path, summary = %description.summary, "Abstract");

        let intent = description_intent(&description, self.provider.model());
        if dry_run {
            tracing::info!(path = %path, "Dry run, not writing description");
            return Ok(FileOutcome::WouldWrite);
        }
        store.write_fields(&file.path, &intent)?;
        tracing::info!(path = %path, tags = description.tags.len(), "Wrote description");
        Ok(FileOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionError;
    use crate::describe::DescribeError;
    use crate::testing::{FakeConverter, MemoryStore, ScriptedProvider};
    use std::path::{Path, PathBuf};

    const GOOD_REPLY: &str = r#"{"tags": ["beach ", "sunset", "Strand", "Sonnenuntergang"], "headline": " Sunset at the beach ", "abstract": "The sun sets over a quiet beach. "}"#;

    /// A real file on disk, since the tagger reads the image bytes.
    fn image_file(dir: &Path, name: &str) -> MediaFile {
        let path = dir.join(name);
        std::fs::write(&path, b"image bytes").unwrap();
        MediaFile::from_path(path).unwrap()
    }

    fn tagger(provider: ScriptedProvider, overwrite: bool) -> ContentTagger<ScriptedProvider, FakeConverter> {
        ContentTagger::builder()
            .provider(provider)
            .converter(FakeConverter::default())
            .overwrite(overwrite)
            .build()
    }

    #[test]
    fn test_any_alias_marks_image_as_tagged() {
        let subject_only: FieldValues = [(Field::Subject, FieldValue::List(vec!["beach".into()]))]
            .into_iter()
            .collect();
        let keywords_only: FieldValues = [(Field::Keywords, FieldValue::Text("beach".into()))]
            .into_iter()
            .collect();
        let blank: FieldValues = [(Field::Keywords, FieldValue::Text(String::new()))]
            .into_iter()
            .collect();

        assert!(has_existing_tags(&subject_only));
        assert!(has_existing_tags(&keywords_only));
        assert!(!has_existing_tags(&blank));
        assert!(!has_existing_tags(&FieldValues::default()));
    }

    #[test]
    fn test_intent_mirrors_description_into_all_aliases() {
        let description = ContentDescription {
            tags: vec!["dog".into(), "Hund".into()],
            headline: "A dog".into(),
            summary: "A dog runs on the beach.".into(),
        };
        let intent = description_intent(&description, "gemma3:27b");

        let tags = FieldValue::List(vec!["dog".into(), "Hund".into()]);
        assert_eq!(intent.len(), 8);
        assert_eq!(intent.get(Field::Keywords), Some(&tags));
        assert_eq!(intent.get(Field::Subject), Some(&tags));
        assert_eq!(intent.get(Field::WriterEditor), Some(&FieldValue::Text("gemma3:27b".into())));
        for field in [Field::Headline, Field::Title, Field::ImageDescription] {
            assert_eq!(intent.get(field), Some(&FieldValue::Text("A dog".into())));
        }
        for field in [Field::CaptionAbstract, Field::Description] {
            assert_eq!(
                intent.get(field),
                Some(&FieldValue::Text("A dog runs on the beach.".into()))
            );
        }
    }

    #[tokio::test]
    async fn test_untagged_image_gets_trimmed_description() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let outcome = tagger.tag_file(&mut store, &file, false).await.unwrap();

        assert_eq!(outcome, FileOutcome::Written);
        assert_eq!(store.write_count(), 1);
        assert_eq!(
            store.value(&file.path, Field::Keywords),
            Some(&FieldValue::List(vec![
                "beach".into(),
                "sunset".into(),
                "Strand".into(),
                "Sonnenuntergang".into()
            ]))
        );
        assert_eq!(
            store.value(&file.path, Field::Headline),
            Some(&FieldValue::Text("Sunset at the beach".into()))
        );
        assert_eq!(
            store.value(&file.path, Field::WriterEditor),
            Some(&FieldValue::Text(ScriptedProvider::MODEL.into()))
        );
        assert_eq!(tagger.provider.calls(), 1);
        assert_eq!(tagger.provider.last_image(), Some(b"image bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_tagged_image_is_skipped_without_asking_the_provider() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default().with_list(&file.path, Field::Subject, &["beach"]);
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let outcome = tagger.tag_file(&mut store, &file, false).await.unwrap();

        assert_eq!(outcome, FileOutcome::Skipped(SkipReason::AlreadyTagged));
        assert_eq!(tagger.provider.calls(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_overwrite_describes_tagged_image_again() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default().with_text(&file.path, Field::Keywords, "old");
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), true);

        let outcome = tagger.tag_file(&mut store, &file, false).await.unwrap();

        assert_eq!(outcome, FileOutcome::Written);
        assert_eq!(tagger.provider.calls(), 1);
        assert_ne!(
            store.value(&file.path, Field::Keywords),
            Some(&FieldValue::Text("old".into()))
        );
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        tagger.tag_file(&mut store, &file, false).await.unwrap();
        let after_first = store.clone();
        let second = tagger.tag_file(&mut store, &file, false).await.unwrap();

        assert_eq!(second, FileOutcome::Skipped(SkipReason::AlreadyTagged));
        assert_eq!(store, after_first);
        assert_eq!(tagger.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_missing_headline_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(
            ScriptedProvider::replying(r#"{"tags": ["beach"], "abstract": "A beach."}"#),
            false,
        );

        let result = tagger.tag_file(&mut store, &file, false).await;

        assert!(matches!(
            result,
            Err(ReconcilerError::Description(ref e)) if e.is_schema_violation()
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_tags_write_nothing_on_any_run() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(
            ScriptedProvider::replying(r#"{"tags": [" ", ""], "headline": "H", "abstract": "A"}"#),
            false,
        );

        for _ in 0..2 {
            let result = tagger.tag_file(&mut store, &file, false).await;
            assert!(matches!(
                result,
                Err(ReconcilerError::Description(DescribeError::NoTags))
            ));
        }
        assert_eq!(store.write_count(), 0);
        assert!(store.value(&file.path, Field::Headline).is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(ScriptedProvider::failing(), false);

        let result = tagger.tag_file(&mut store, &file, false).await;

        assert!(matches!(
            result,
            Err(ReconcilerError::Description(DescribeError::Api { status: 503, .. }))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_heic_is_described_from_converted_copy() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "IMG_1234.HEIC");
        let mut store = MemoryStore::default();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let outcome = tagger.tag_file(&mut store, &file, false).await.unwrap();

        assert_eq!(outcome, FileOutcome::Written);
        assert_eq!(tagger.converter.converted(), vec![file.path.clone()]);
        assert_eq!(
            tagger.provider.last_image(),
            Some(FakeConverter::JPEG_BYTES.to_vec())
        );
        // Metadata goes to the original file, not the temporary copy.
        assert!(store.value(&file.path, Field::Headline).is_some());
    }

    #[tokio::test]
    async fn test_conversion_failure_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "IMG_1234.heic");
        let mut store = MemoryStore::default();
        let tagger = ContentTagger::builder()
            .provider(ScriptedProvider::replying(GOOD_REPLY))
            .converter(FakeConverter::failing())
            .build();

        let result = tagger.tag_file(&mut store, &file, false).await;

        assert!(matches!(
            result,
            Err(ReconcilerError::Conversion(ConversionError::Failed { .. }))
        ));
        assert_eq!(tagger.provider.calls(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default().failing_writes();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let result = tagger.tag_file(&mut store, &file, false).await;
        assert!(matches!(result, Err(ReconcilerError::Metadata(ref e)) if !e.is_read()));
    }

    #[tokio::test]
    async fn test_dry_run_asks_provider_but_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let file = image_file(dir.path(), "beach.jpg");
        let mut store = MemoryStore::default();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let outcome = tagger.tag_file(&mut store, &file, true).await.unwrap();

        assert_eq!(outcome, FileOutcome::WouldWrite);
        assert_eq!(tagger.provider.calls(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_file_is_an_io_error() {
        let mut store = MemoryStore::default();
        let file = MediaFile::from_path(PathBuf::from("/nonexistent/beach.jpg")).unwrap();
        let tagger = tagger(ScriptedProvider::replying(GOOD_REPLY), false);

        let result = tagger.tag_file(&mut store, &file, false).await;
        assert!(matches!(result, Err(ReconcilerError::Io(_))));
    }
}
