use crate::components::google_calendar::time::get_event_start;
use crate::components::{notify, CalendarEvent, EventSource, Messenger};
use crate::error::BotResult;
use crate::sync::window::TimeWindow;
use chrono::{DateTime, TimeZone};
use tracing::{info, warn};

/// Text pushed for one of today's events
pub fn reminder_text(event: &CalendarEvent) -> String {
    let summary = event.summary.as_deref().unwrap_or("Unnamed event");
    match get_event_start(event) {
        Ok(Some(start)) if event.start_date_time.is_some() => {
            format!("Today's event: {} ({})", summary, start.format("%-H:%M"))
        }
        _ => format!("Today's event: {}", summary),
    }
}

/// Push one message per event happening today on any of the calendars.
///
/// Calendars are visited in the given order, each only once. Delivery
/// failures are logged and skipped; fetch failures propagate. Returns the
/// number of messages delivered.
pub async fn send_todays_reminders<Tz: TimeZone>(
    events: &dyn EventSource,
    messenger: &dyn Messenger,
    calendar_ids: &[String],
    target_id: &str,
    now: &DateTime<Tz>,
) -> BotResult<usize> {
    let today = TimeWindow::today(now)?;
    let mut seen: Vec<&str> = Vec::new();
    let mut delivered = 0;

    for calendar_id in calendar_ids {
        if seen.contains(&calendar_id.as_str()) {
            continue;
        }
        seen.push(calendar_id);

        let todays_events = events.fetch_events(calendar_id, &today).await?;
        info!(
            "Found {} events today in calendar {}",
            todays_events.len(),
            calendar_id
        );

        for event in todays_events.iter().filter(|e| e.has_summary()) {
            if notify(messenger, target_id, &reminder_text(event)).await {
                delivered += 1;
            } else {
                warn!("Reminder for event {} was not delivered", event.id);
            }
        }
    }

    Ok(delivered)
}
