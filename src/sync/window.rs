use crate::config::DEFAULT_TIME_OFFSET;
use crate::error::{config_error, other_error, BotResult};
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Extra margin on both ends of the window when filtering sheet rows.
///
/// The calendar's own range filter returns events slightly outside the
/// requested bounds, so rows just outside the window must stay candidates.
pub fn row_filter_tolerance() -> Duration {
    Duration::days(2)
}

/// How far back and ahead of now a sweep looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    pub lookback: Duration,
    pub lookahead: Duration,
}

impl Default for WindowSettings {
    fn default() -> Self {
        let offset = Duration::seconds(DEFAULT_TIME_OFFSET as i64);
        Self {
            lookback: offset,
            lookahead: offset,
        }
    }
}

/// Inclusive range of instants, `start <= end`.
///
/// Serializable so a sweep's window can be recorded and replayed with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> BotResult<Self> {
        if start > end {
            return Err(config_error(&format!(
                "Time window starts at {} after it ends at {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// `[now - lookback, now + lookahead]`
    pub fn around(now: DateTime<Utc>, settings: &WindowSettings) -> BotResult<Self> {
        let start = now
            .checked_sub_signed(settings.lookback)
            .ok_or_else(|| config_error("Lookback reaches before the earliest date"))?;
        let end = now
            .checked_add_signed(settings.lookahead)
            .ok_or_else(|| config_error("Lookahead reaches past the latest date"))?;
        Self::new(start, end)
    }

    /// Local midnight of `now`'s day up to one second before the next midnight
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> BotResult<Self> {
        let day = now.date_naive();
        let midnight = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| other_error("Failed to create midnight"))?;
        let next_midnight = day
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| other_error("Failed to create next midnight"))?;

        let tz = now.timezone();
        let start = resolve_local(&tz, &midnight)?;
        let end = resolve_local(&tz, &next_midnight)? - Duration::seconds(1);
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Inclusive on both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The window widened by [`row_filter_tolerance`] on each side, for
    /// deciding which sheet rows are matching candidates
    pub fn with_tolerance(&self) -> Self {
        let tolerance = row_filter_tolerance();
        Self {
            start: self.start.checked_sub_signed(tolerance).unwrap_or(self.start),
            end: self.end.checked_add_signed(tolerance).unwrap_or(self.end),
        }
    }

    /// Whether an offset-free wall time, read as UTC, falls in the window
    pub fn contains_naive(&self, wall_time: &NaiveDateTime) -> bool {
        self.contains(wall_time.and_utc())
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: &NaiveDateTime) -> BotResult<DateTime<Utc>> {
    // A midnight skipped by a DST jump has no instant; take the earliest of
    // an ambiguous pair
    match tz.from_local_datetime(local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(other_error(&format!("Invalid local time {}", local))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_around_default_settings() {
        let now = utc(2024, 3, 1, 12, 0, 0);
        let window = TimeWindow::around(now, &WindowSettings::default()).unwrap();
        assert_eq!(window.start(), now - Duration::days(31));
        assert_eq!(window.end(), now + Duration::days(31));
    }

    #[test]
    fn test_around_zero_offsets() {
        let now = utc(2024, 3, 1, 12, 0, 0);
        let settings = WindowSettings {
            lookback: Duration::zero(),
            lookahead: Duration::zero(),
        };
        let window = TimeWindow::around(now, &settings).unwrap();
        assert_eq!(window.start(), window.end());
        assert!(window.contains(now));
    }

    #[test]
    fn test_new_rejects_inverted_window() {
        assert!(TimeWindow::new(utc(2024, 3, 2, 0, 0, 0), utc(2024, 3, 1, 0, 0, 0)).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = TimeWindow::new(utc(2024, 3, 1, 0, 0, 0), utc(2024, 3, 31, 0, 0, 0)).unwrap();
        assert!(window.contains(utc(2024, 3, 1, 0, 0, 0)));
        assert!(window.contains(utc(2024, 3, 31, 0, 0, 0)));
        assert!(!window.contains(utc(2024, 2, 29, 23, 59, 59)));
        assert!(!window.contains(utc(2024, 3, 31, 0, 0, 1)));
    }

    #[test]
    fn test_tolerance_boundaries() {
        let window = TimeWindow::new(utc(2024, 3, 10, 0, 0, 0), utc(2024, 3, 20, 0, 0, 0)).unwrap();
        let loose = window.with_tolerance();

        // Exactly two days outside is kept, one second further is not
        assert!(loose.contains(utc(2024, 3, 8, 0, 0, 0)));
        assert!(!loose.contains(utc(2024, 3, 7, 23, 59, 59)));
        assert!(loose.contains(utc(2024, 3, 22, 0, 0, 0)));
        assert!(!loose.contains(utc(2024, 3, 22, 0, 0, 1)));

        // The query window itself is untouched
        assert!(!window.contains(utc(2024, 3, 8, 0, 0, 0)));
    }

    #[test]
    fn test_today_in_utc() {
        let now = utc(2024, 3, 1, 15, 30, 0);
        let today = TimeWindow::today(&now).unwrap();
        assert_eq!(today.start(), utc(2024, 3, 1, 0, 0, 0));
        assert_eq!(today.end(), utc(2024, 3, 1, 23, 59, 59));
    }

    #[test]
    fn test_today_uses_the_local_day() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2024-03-01 01:00 in Tokyo is still Feb 29 in UTC
        let now = tokyo.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap();
        let today = TimeWindow::today(&now).unwrap();
        assert_eq!(today.start(), utc(2024, 2, 29, 15, 0, 0));
        assert_eq!(today.end(), utc(2024, 3, 1, 14, 59, 59));
    }

    #[test]
    fn test_window_is_stored_as_rfc3339() {
        let window = TimeWindow::new(utc(2024, 1, 30, 0, 0, 0), utc(2024, 4, 1, 0, 0, 0)).unwrap();
        let stored = serde_json::to_value(window).unwrap();
        assert_eq!(
            stored,
            serde_json::json!({"start": "2024-01-30T00:00:00Z", "end": "2024-04-01T00:00:00Z"})
        );
        assert_eq!(serde_json::from_value::<TimeWindow>(stored).unwrap(), window);
    }
}
