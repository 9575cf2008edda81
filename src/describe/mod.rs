//! Asking a vision model to describe an image.
mod error;
mod openai;

pub use error::DescribeError;
pub use openai::{DEFAULT_MODEL, OpenAiProvider};

use serde_json::Value;

/// A service that turns image bytes into a structured description.
///
/// `describe` returns the model's raw reply text. Validating it against `schema`
/// is up to the caller, so malformed replies can be told apart from transport
/// failures.
#[allow(async_fn_in_trait)]
pub trait DescriptionProvider {
    /// Identifier of the model answering the requests, recorded as the writer of the metadata.
    fn model(&self) -> &str;

    async fn describe(
        &self,
        image: &[u8],
        instruction: &str,
        schema: &Value,
    ) -> Result<String, DescribeError>;
}
