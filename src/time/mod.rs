//! Reconciling Exif capture dates with the timestamp encoded in the filename.
mod error;
mod filename_parsing;
mod logic;
mod parsing;
pub mod structs;
mod tolerance;

pub use error::DateParseError;
pub use filename_parsing::{FilenamePattern, parse_filename_candidates};
pub use logic::{TIMESTAMP_FIELDS, decide, reconcile_file};
pub use parsing::{format_exif_datetime, parse_exif_datetime};
pub use structs::{ExistingTimestamps, FilenameTimestampCandidate, TimestampDecision};
pub use tolerance::ToleranceWindow;
