use super::structs::ContentDescription;
use crate::describe::DescribeError;
use serde_json::{Value, json};

/// Sent with every image.
pub const INSTRUCTION: &str = "\
Analyze this image. Respond in json format with the following elements:
5-10 tags in english language. Append the same tags in german language to the list.
a headline for the image
a short abstract of the image
Return the json object with the following keys:
Example:
{
\"tags\": [\"tag1\", \"tag2\"],
\"headline\": \"headline\",
\"abstract\": \"abstract\"
}
Do not add any other text. Just respond with the json object.";

/// JSON schema the reply has to follow.
pub fn description_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tags": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 1
            },
            "headline": { "type": "string" },
            "abstract": { "type": "string" }
        },
        "required": ["tags", "headline", "abstract"]
    })
}

/// Parses a raw model reply into a trimmed [`ContentDescription`].
///
/// Some models wrap their JSON in a Markdown code fence even when asked not to;
/// one surrounding fence is stripped before parsing. A reply left without any
/// tag after trimming is rejected, since the image would still count as untagged.
pub fn parse_description(raw: &str) -> Result<ContentDescription, DescribeError> {
    let description: ContentDescription =
        serde_json::from_str(strip_code_fence(raw)).map_err(DescribeError::Malformed)?;
    let description = description.trimmed();
    if description.tags.is_empty() {
        return Err(DescribeError::NoTags);
    }
    Ok(description)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    inner
        .split_once('\n')
        .map_or(inner, |(_, body)| body)
        .trim()
}
