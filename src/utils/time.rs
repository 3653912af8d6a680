use crate::error::{timestamp_error, BotResult};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

/// Format of the `Start`/`End` cells, `yyyy/MM/dd H:mm:ss`.
/// Parsing with it accepts one- or two-digit hours.
pub const SHEET_DATE_FORMAT: &str = "%Y/%m/%d %-H:%M:%S";

/// Calendar date-times once their offset is gone
const EVENT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Calendar all-day dates
const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Written to the sheet when an event has no start
pub const NO_START_DATE: &str = "No start date";

/// Written to the sheet when an event has no end
pub const NO_END_DATE: &str = "No end date";

lazy_static! {
    static ref TIMEZONE_SUFFIX: Regex =
        Regex::new(r"[+-]\d{2}:\d{2}$").expect("valid timezone suffix pattern");
}

/// Remove a trailing `±HH:MM` offset from an ISO-8601-like timestamp.
///
/// `"2024-03-01T10:00:00+02:00"` becomes `"2024-03-01T10:00:00"`; strings
/// without such a suffix are returned unchanged. Only the very end of the
/// string is considered, so the date's own dashes are never touched.
pub fn strip_timezone_suffix(timestamp: &str) -> Cow<'_, str> {
    TIMEZONE_SUFFIX.replace(timestamp, "")
}

/// Parse a calendar `dateTime` into its offset-free wall time
pub fn parse_event_timestamp(timestamp: &str) -> BotResult<NaiveDateTime> {
    let stripped = strip_timezone_suffix(timestamp);
    let stripped = stripped.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(stripped, EVENT_DATE_TIME_FORMAT)
        .map_err(|e| timestamp_error(timestamp, e))
}

/// Parse a calendar all-day `date` as midnight of that day
pub fn parse_event_date(date: &str) -> BotResult<NaiveDateTime> {
    let day = NaiveDate::parse_from_str(date, EVENT_DATE_FORMAT)
        .map_err(|e| timestamp_error(date, e))?;
    day.and_hms_opt(0, 0, 0)
        .ok_or_else(|| timestamp_error(date, "no midnight on this day"))
}

/// Parse the text of a sheet `Start` cell
pub fn parse_sheet_timestamp(text: &str) -> BotResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), SHEET_DATE_FORMAT)
        .map_err(|e| timestamp_error(text, format!("expected yyyy/MM/dd H:mm:ss ({})", e)))
}

pub fn format_sheet_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(SHEET_DATE_FORMAT).to_string()
}
