use super::error::DateParseError;
use super::structs::FilenameTimestampCandidate;
use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::OnceLock;

static RE_DD_MM_YY_HH_MM_SS: OnceLock<Regex> = OnceLock::new();
static RE_IMG_PANO_YYYYMMDD_HHMMSS: OnceLock<Regex> = OnceLock::new();

/// The filename conventions a capture time can be recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenamePattern {
    /// `DD-MM-YY HH-MM-SS`, the time part may also use dots. The year is always `2000 + YY`.
    DayMonthShortYear,
    /// `IMG_YYYYMMDD_HHMMSS` or `PANO_YYYYMMDD_HHMMSS`, as written by Android cameras.
    CameraPrefix,
}

/// Extracts every capture time encoded in a basename.
///
/// Both patterns are tried independently, day-month-year first, so a filename
/// carrying both forms yields two candidates. An empty result means no pattern
/// matched. A match whose digits are not a real date/time is returned as an
/// error in its slot.
pub fn parse_filename_candidates(
    filename: &str,
) -> Vec<Result<FilenameTimestampCandidate, DateParseError>> {
    let mut candidates = Vec::new();

    // --- Attempt 1: DD-MM-YY HH-MM-SS ---
    let re_short = RE_DD_MM_YY_HH_MM_SS.get_or_init(|| {
        Regex::new(r"([0-9]{2})-([0-9]{2})-([0-9]{2}) ([0-9]{2})[-.]([0-9]{2})[-.]([0-9]{2})").unwrap()
    });
    if let Some(caps) = re_short.captures(filename) {
        candidates.push(build_candidate(
            filename,
            &caps,
            FilenamePattern::DayMonthShortYear,
            2000,
            [3, 2, 1, 4, 5, 6],
        ));
    }

    // --- Attempt 2: (IMG|PANO)_YYYYMMDD_HHMMSS ---
    let re_camera = RE_IMG_PANO_YYYYMMDD_HHMMSS.get_or_init(|| {
        Regex::new(r"(?:IMG|PANO)_([0-9]{4})([0-9]{2})([0-9]{2})_([0-9]{2})([0-9]{2})([0-9]{2})")
            .unwrap()
    });
    if let Some(caps) = re_camera.captures(filename) {
        candidates.push(build_candidate(
            filename,
            &caps,
            FilenamePattern::CameraPrefix,
            0,
            [1, 2, 3, 4, 5, 6],
        ));
    }

    candidates
}

fn number(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn captured_datetime(caps: &Captures, year_base: u32, groups: [usize; 6]) -> Option<NaiveDateTime> {
    let [year, month, day, hour, minute, second] = groups.map(|group| number(caps, group));
    let year = i32::try_from(year_base.checked_add(year?)?).ok()?;
    NaiveDate::from_ymd_opt(year, month?, day?)?.and_hms_opt(hour?, minute?, second?)
}

/// `groups` holds the capture group indices of year, month, day, hour, minute
/// and second. `year_base` is added to the captured year.
fn build_candidate(
    filename: &str,
    caps: &Captures,
    pattern: FilenamePattern,
    year_base: u32,
    groups: [usize; 6],
) -> Result<FilenameTimestampCandidate, DateParseError> {
    captured_datetime(caps, year_base, groups)
        .map(|datetime| FilenameTimestampCandidate { datetime, pattern })
        .ok_or_else(|| DateParseError {
            filename: filename.to_string(),
            matched: caps[0].to_string(),
        })
}
