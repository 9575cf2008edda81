//! Filling in tags, headline and abstract for images that have none.
mod logic;
mod schema;
pub mod structs;

pub use logic::{ALIAS_FIELDS, ContentTagger, description_intent, has_existing_tags};
pub use schema::{INSTRUCTION, description_schema, parse_description};
pub use structs::ContentDescription;
