use serde::{Deserialize, Serialize};

/// What the vision model says about an image.
///
/// All three keys are required; a reply missing any of them is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentDescription {
    /// English tags followed by the same tags in German.
    pub tags: Vec<String>,
    pub headline: String,
    #[serde(rename = "abstract")]
    pub summary: String,
}

impl ContentDescription {
    /// Trims every string and drops tags that end up empty.
    pub fn trimmed(self) -> Self {
        Self {
            tags: self
                .tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect(),
            headline: self.headline.trim().to_string(),
            summary: self.summary.trim().to_string(),
        }
    }
}
