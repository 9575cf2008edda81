use super::{DescribeError, DescriptionProvider};
use crate::ReconcilerError;
use base64::{Engine as _, engine::general_purpose};
use bon::bon;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemma3:27b";

const USER_AGENT: &str = concat!("photo-reconciler/", env!("CARGO_PKG_VERSION"));
const SCHEMA_NAME: &str = "image_description";

/// [`DescriptionProvider`] for any server speaking the OpenAI chat completions API
/// (OpenAI itself, Ollama, vLLM, LM Studio, ...).
///
/// Use the builder to construct it:
/// ```rust
/// # use photo_reconciler::{OpenAiProvider, ReconcilerError};
/// # fn main() -> Result<(), ReconcilerError> {
/// let provider = OpenAiProvider::builder()
///     .base_url("http://localhost:11434/v1")
///     .api_key("ollama")
///     .model("gemma3:27b")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[bon]
impl OpenAiProvider {
    /// # Builder Arguments
    ///
    /// * `base_url` - Root of the API, e.g. `https://api.openai.com/v1`. `/chat/completions` is appended.
    /// * `api_key` - Sent as a bearer token.
    /// * `model` - (Default: `gemma3:27b`) Model identifier sent with every request.
    /// * `timeout` - (Default: 120 s) Upper bound for one request.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        #[builder(into)] api_key: String,
        #[builder(into, default = DEFAULT_MODEL.to_string())] model: String,
        #[builder(default = Duration::from_secs(120))] timeout: Duration,
    ) -> Result<Self, ReconcilerError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(ReconcilerError::HttpClient)?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }
}

impl DescriptionProvider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn describe(
        &self,
        image: &[u8],
        instruction: &str,
        schema: &Value,
    ) -> Result<String, DescribeError> {
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, %schema, "Sending image to AI server");
        let body = request_body(&self.model, instruction, image, schema);

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DescribeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DescribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(DescribeError::Transport)?;
        let content = reply_content(completion)?;
        tracing::debug!(reply = %content, "Raw AI reply");
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// A single user message with the instruction and the image as a JPEG data URL,
/// constrained to answer in JSON matching `schema`.
fn request_body(model: &str, instruction: &str, image: &[u8], schema: &Value) -> Value {
    let data_url = format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(image)
    );
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": instruction },
                { "type": "image_url", "image_url": { "url": data_url, "detail": "auto" } }
            ]
        }],
        "response_format": {
            "type": "json_schema",
            "json_schema": { "name": SCHEMA_NAME, "schema": schema }
        }
    })
}

fn reply_content(completion: ChatCompletion) -> Result<String, DescribeError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(DescribeError::EmptyReply)
}
