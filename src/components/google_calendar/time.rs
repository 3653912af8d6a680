use super::models::CalendarEvent;
use crate::error::BotResult;
use crate::utils::time::{parse_event_date, parse_event_timestamp};
use chrono::NaiveDateTime;

/// Get event start as offset-free wall time.
///
/// Timed events use `dateTime`, all-day events start at midnight of `date`.
pub fn get_event_start(event: &CalendarEvent) -> BotResult<Option<NaiveDateTime>> {
    resolve(event.start_date_time.as_deref(), event.start_date.as_deref())
}

/// Get event end as offset-free wall time
pub fn get_event_end(event: &CalendarEvent) -> BotResult<Option<NaiveDateTime>> {
    resolve(event.end_date_time.as_deref(), event.end_date.as_deref())
}

fn resolve(date_time: Option<&str>, date: Option<&str>) -> BotResult<Option<NaiveDateTime>> {
    if let Some(date_time) = date_time {
        Ok(Some(parse_event_timestamp(date_time)?))
    } else if let Some(date) = date {
        Ok(Some(parse_event_date(date)?))
    } else {
        Ok(None)
    }
}
