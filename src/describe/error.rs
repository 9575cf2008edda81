use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescribeError {
    // --- Transport class ---
    #[error("Request to the AI server failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("AI server answered with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("AI server reply contained no message")]
    EmptyReply,

    // --- Schema class ---
    #[error("Reply is not a valid image description: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Reply contains no usable tags")]
    NoTags,
}

impl DescribeError {
    /// True when the server answered, but not with a description matching the schema.
    pub const fn is_schema_violation(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::NoTags)
    }
}
