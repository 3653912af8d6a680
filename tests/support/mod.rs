//! Hand-written collaborators for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use calendar_to_sheet::components::{
    CalendarEvent, EventSource, Messenger, NewRow, RowSink, RowSource, SpreadsheetRow,
};
use calendar_to_sheet::config::Config;
use calendar_to_sheet::error::{fetch_error, messaging_error, BotResult};
use calendar_to_sheet::sync::TimeWindow;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Instant all scenario windows are centred on
pub fn scenario_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// Default 31 day window around [`scenario_now`]
pub fn scenario_window() -> TimeWindow {
    TimeWindow::around(scenario_now(), &Default::default()).unwrap()
}

pub fn timed_event(id: &str, summary: &str, start: &str) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        start_date_time: Some(start.to_string()),
        ..Default::default()
    }
}

pub fn sheet_row(student: &str, start: &str) -> SpreadsheetRow {
    SpreadsheetRow {
        student: Some(student.to_string()),
        start: Some(start.to_string()),
    }
}

/// Config for run loop tests, pairs given as (calendar, sheet)
pub fn test_config(pairs: &[(&str, &str)], replay_path: &Path, extra: &[(&str, &str)]) -> Config {
    let pairs_json = serde_json::to_string(
        &pairs
            .iter()
            .map(|(c, s)| serde_json::json!({"calendarId": c, "sheetTitle": s}))
            .collect::<Vec<_>>(),
    )
    .unwrap();

    let mut vars: HashMap<String, String> = HashMap::from([
        ("GOOGLE_CREDENTIALS".to_string(), "{}".to_string()),
        ("SHEET_ID".to_string(), "test-document".to_string()),
        ("CALENDAR_SHEET_CONFIGURATIONS".to_string(), pairs_json),
        (
            "REPLAY_PATH".to_string(),
            replay_path.to_string_lossy().to_string(),
        ),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Calendar with fixed events per calendar id
#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<HashMap<String, Vec<CalendarEvent>>>,
    failing: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<(String, TimeWindow)>>,
    /// When each fetch began, on tokio's clock
    pub started: Mutex<Vec<Instant>>,
    delay: Option<Duration>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.events
            .lock()
            .unwrap()
            .insert(calendar_id.to_string(), events);
        self
    }

    /// Make every fetch take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make fetches for `calendar_id` fail
    pub fn failing_for(self, calendar_id: &str) -> Self {
        self.failing.lock().unwrap().push(calendar_id.to_string());
        self
    }

    pub fn set_events(&self, calendar_id: &str, events: Vec<CalendarEvent>) {
        self.events
            .lock()
            .unwrap()
            .insert(calendar_id.to_string(), events);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calendar ids fetched so far, in order
    pub fn fetched_calendars(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(calendar_id, _)| calendar_id.clone())
            .collect()
    }
}

#[async_trait]
impl EventSource for MockCalendar {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        self.calls
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), *window));
        self.started.lock().unwrap().push(Instant::now());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().iter().any(|c| c == calendar_id) {
            return Err(fetch_error(&format!("calendar {} unavailable", calendar_id)));
        }

        // Same contract as the real adapter: untitled events never leave it
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(CalendarEvent::has_summary)
            .collect())
    }
}

/// In-memory spreadsheet; appended rows become readable rows
#[derive(Default)]
pub struct MockSheet {
    rows: Mutex<HashMap<String, Vec<SpreadsheetRow>>>,
    pub appended: Mutex<Vec<(String, NewRow)>>,
    pub append_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    fail_appends: bool,
}

impl MockSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, sheet_title: &str, rows: Vec<SpreadsheetRow>) -> Self {
        self.rows.lock().unwrap().insert(sheet_title.to_string(), rows);
        self
    }

    pub fn failing_appends(mut self) -> Self {
        self.fail_appends = true;
        self
    }

    pub fn rows_of(&self, sheet_title: &str) -> Vec<SpreadsheetRow> {
        self.rows
            .lock()
            .unwrap()
            .get(sheet_title)
            .cloned()
            .unwrap_or_default()
    }

    pub fn appended_rows(&self) -> Vec<(String, NewRow)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowSource for MockSheet {
    async fn fetch_rows(&self, sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows_of(sheet_title))
    }
}

#[async_trait]
impl RowSink for MockSheet {
    async fn append_rows(&self, sheet_title: &str, rows: &[NewRow]) -> BotResult<usize> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends {
            return Err(calendar_to_sheet::error::append_error("quota exceeded"));
        }

        let mut sheet_rows = self.rows.lock().unwrap();
        let target = sheet_rows.entry(sheet_title.to_string()).or_default();
        let mut appended = self.appended.lock().unwrap();
        for row in rows {
            target.push(SpreadsheetRow {
                student: Some(row.student.clone()),
                start: Some(row.start.clone()),
            });
            appended.push((sheet_title.to_string(), row.clone()));
        }
        Ok(rows.len())
    }
}

/// Collaborator that fails every call, standing in for "no network"
pub struct Offline;

#[async_trait]
impl EventSource for Offline {
    async fn fetch_events(
        &self,
        _calendar_id: &str,
        _window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        Err(fetch_error("network access attempted"))
    }
}

#[async_trait]
impl RowSource for Offline {
    async fn fetch_rows(&self, _sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>> {
        Err(fetch_error("network access attempted"))
    }
}

/// Messenger remembering what it sent; texts containing `fail_on` fail
#[derive(Default)]
pub struct MockMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail_on: Option<String>,
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, target_id: &str, text: &str) -> BotResult<()> {
        if let Some(fail_on) = &self.fail_on {
            if text.contains(fail_on.as_str()) {
                return Err(messaging_error("push rejected"));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((target_id.to_string(), text.to_string()));
        Ok(())
    }
}
