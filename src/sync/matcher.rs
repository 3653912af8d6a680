use crate::components::google_calendar::time::get_event_start;
use crate::components::{CalendarEvent, SpreadsheetRow};
use crate::error::BotResult;
use crate::sync::window::TimeWindow;
use crate::utils::time::{parse_sheet_timestamp, NO_START_DATE};
use chrono::NaiveDateTime;

/// A sheet row ready for matching, its start already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    pub student: Option<String>,
    pub start: NaiveDateTime,
}

impl SheetRecord {
    /// Parse a raw row.
    ///
    /// Rows without a start, or with the placeholder written for start-less
    /// events, yield `None`; any other unparseable start is an error.
    pub fn from_row(row: &SpreadsheetRow) -> BotResult<Option<Self>> {
        let Some(start) = row.start.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if start.is_empty() || start == NO_START_DATE {
            return Ok(None);
        }

        Ok(Some(Self {
            student: row.student.clone(),
            start: parse_sheet_timestamp(start)?,
        }))
    }
}

/// Keep the rows whose start falls inside the window widened by the
/// row filter tolerance
pub fn filter_rows(rows: &[SpreadsheetRow], window: &TimeWindow) -> BotResult<Vec<SheetRecord>> {
    let loose = window.with_tolerance();
    let mut records = Vec::new();

    for row in rows {
        if let Some(record) = SheetRecord::from_row(row)? {
            if loose.contains_naive(&record.start) {
                records.push(record);
            }
        }
    }

    Ok(records)
}

/// Whether a sheet row and a calendar event describe the same lesson.
///
/// The row's `Student` must equal the event summary byte for byte, and both
/// starts must be the same instant once the event's offset is stripped.
/// A missing label on either side never matches.
pub fn is_same(record: &SheetRecord, event: &CalendarEvent) -> BotResult<bool> {
    let labels_match = match (record.student.as_deref(), event.summary.as_deref()) {
        (Some(student), Some(summary)) => student == summary,
        _ => false,
    };
    if !labels_match {
        return Ok(false);
    }

    Ok(get_event_start(event)?.is_some_and(|start| start == record.start))
}
