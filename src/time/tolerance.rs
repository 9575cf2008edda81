use chrono::{NaiveDateTime, TimeDelta};

/// How far apart two timestamps may be and still describe the same moment.
///
/// Differences up to and including the window are clock skew; anything larger is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceWindow(TimeDelta);

impl ToleranceWindow {
    pub const fn new(window: TimeDelta) -> Self {
        Self(window)
    }

    pub fn conflicts(self, a: NaiveDateTime, b: NaiveDateTime) -> bool {
        a.signed_duration_since(b).abs() > self.0
    }
}

impl Default for ToleranceWindow {
    /// 24 hours.
    fn default() -> Self {
        Self(TimeDelta::seconds(24 * 3600))
    }
}
