//! Converting between Exif date strings and chrono types.

use chrono::NaiveDateTime;

const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Parses a naive datetime string as found in Exif (YYYY:MM:DD HH:MM:SS[.fff]).
///
/// Also accepts dashes as the date separator, which some tools write.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let formats = [
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    let s = s.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Cameras without a clock write all zeroes (or spaces) instead of leaving the tag out.
pub fn is_placeholder_datetime(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0' | ':' | ' ' | '-'))
}

pub fn format_exif_datetime(dt: NaiveDateTime) -> String {
    dt.format(EXIF_FORMAT).to_string()
}
