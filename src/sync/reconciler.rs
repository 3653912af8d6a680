use crate::components::google_calendar::time::{get_event_end, get_event_start};
use crate::components::{
    CalendarEvent, EventSource, NewRow, RowSink, RowSource, SpreadsheetRow,
};
use crate::error::BotResult;
use crate::sync::matcher::{filter_rows, is_same};
use crate::sync::replay::{ReplayKey, ReplayOperation, ReplayRecorder};
use crate::sync::window::TimeWindow;
use crate::utils::time::{format_sheet_timestamp, NO_END_DATE, NO_START_DATE};
use tracing::{debug, info};

/// One reconciliation pass: calendar events missing from a sheet get appended.
///
/// Rows without a calendar counterpart are left alone; the sheet may hold
/// manual or historical entries outside the queried window.
pub struct Reconciler<'a> {
    events: &'a dyn EventSource,
    rows: &'a dyn RowSource,
    sink: &'a dyn RowSink,
}

impl<'a> Reconciler<'a> {
    pub fn new(events: &'a dyn EventSource, rows: &'a dyn RowSource, sink: &'a dyn RowSink) -> Self {
        Self { events, rows, sink }
    }

    /// Events of `calendar_id` inside `window` that no candidate row of
    /// `sheet_title` matches, in calendar order
    pub async fn unmatched_events(
        &self,
        recorder: &mut ReplayRecorder,
        calendar_id: &str,
        sheet_title: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        let events_key = ReplayKey::new(ReplayOperation::CalendarEvents, calendar_id, sheet_title);
        let events: Vec<CalendarEvent> = recorder
            .record(&events_key, || self.events.fetch_events(calendar_id, window))
            .await?;

        let rows_key = ReplayKey::new(ReplayOperation::SpreadsheetRecords, calendar_id, sheet_title);
        let rows: Vec<SpreadsheetRow> = recorder
            .record(&rows_key, || self.rows.fetch_rows(sheet_title))
            .await?;

        debug!("Fetched {} rows from sheet. Filtering rows...", rows.len());
        let records = filter_rows(&rows, window)?;
        debug!("{} rows left after filter", records.len());

        let mut unmatched = Vec::new();
        for event in events.into_iter().filter(CalendarEvent::has_summary) {
            let mut found = false;
            for record in &records {
                if is_same(record, &event)? {
                    found = true;
                    break;
                }
            }
            if !found {
                unmatched.push(event);
            }
        }

        Ok(unmatched)
    }

    /// Append every unmatched event as a row, returning how many the sheet
    /// reports as appended
    pub async fn reconcile(
        &self,
        recorder: &mut ReplayRecorder,
        calendar_id: &str,
        sheet_title: &str,
        window: &TimeWindow,
    ) -> BotResult<usize> {
        let unmatched = self
            .unmatched_events(recorder, calendar_id, sheet_title, window)
            .await?;

        if unmatched.is_empty() {
            info!("No events to insert into sheet {}", sheet_title);
            return Ok(0);
        }

        let rows = unmatched
            .iter()
            .map(event_to_row)
            .collect::<BotResult<Vec<_>>>()?;

        info!("Adding {} rows to sheet {}...", rows.len(), sheet_title);
        let appended = self.sink.append_rows(sheet_title, &rows).await?;
        info!("Added {} rows to sheet {}.", appended, sheet_title);
        debug!("Rows added: {:?}", rows);

        Ok(appended)
    }
}

/// Row written for an event missing from the sheet
pub fn event_to_row(event: &CalendarEvent) -> BotResult<NewRow> {
    let start = get_event_start(event)?
        .map(|start| format_sheet_timestamp(&start))
        .unwrap_or_else(|| NO_START_DATE.to_string());
    let end = get_event_end(event)?
        .map(|end| format_sheet_timestamp(&end))
        .unwrap_or_else(|| NO_END_DATE.to_string());

    Ok(NewRow {
        student: event.summary.clone().unwrap_or_default(),
        start,
        end,
    })
}
