//! Record/replay of the time windows and external fetches of a run.
//!
//! In recording mode every wrapped operation runs for real and its result is
//! kept under a [`ReplayKey`]; [`ReplayRecorder::end_run`] writes them all to
//! one pretty-printed JSON file, replacing whatever was there. In replay mode
//! nothing runs: results come from that file instead, so a captured run can
//! be re-executed offline and deterministically.

use crate::error::{BotResult, Error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Whether operations run for real or come from the last recorded run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    Record,
    Replay,
}

impl ReplayMode {
    pub fn from_flag(replay: bool) -> Self {
        if replay {
            ReplayMode::Replay
        } else {
            ReplayMode::Record
        }
    }
}

/// Kind of operation being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOperation {
    TimeWindow,
    CalendarEvents,
    SpreadsheetRecords,
}

impl ReplayOperation {
    fn as_str(&self) -> &'static str {
        match self {
            ReplayOperation::TimeWindow => "timeWindow",
            ReplayOperation::CalendarEvents => "calendarEvents",
            ReplayOperation::SpreadsheetRecords => "spreadsheetRecords",
        }
    }
}

/// Identifies one recorded operation within a run.
///
/// Keys are namespaced by calendar and sheet, so the same operation for two
/// pairs never collides. Rendered as `<operation>-<calendarId>-<sheetTitle>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayKey {
    operation: ReplayOperation,
    calendar_id: String,
    sheet_title: String,
}

impl ReplayKey {
    pub fn new(operation: ReplayOperation, calendar_id: &str, sheet_title: &str) -> Self {
        Self {
            operation,
            calendar_id: calendar_id.to_string(),
            sheet_title: sheet_title.to_string(),
        }
    }
}

impl fmt::Display for ReplayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.operation.as_str(),
            self.calendar_id,
            self.sheet_title
        )
    }
}

/// Records operation results, or replays them from the last recorded run
#[derive(Debug)]
pub struct ReplayRecorder {
    mode: ReplayMode,
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl ReplayRecorder {
    pub fn new(mode: ReplayMode, path: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_replaying(&self) -> bool {
        self.mode == ReplayMode::Replay
    }

    /// Begin a run.
    ///
    /// Recording starts from an empty map; replaying loads the whole
    /// recorded file.
    pub async fn start_run(&mut self) -> BotResult<()> {
        self.entries.clear();

        if self.is_replaying() {
            let content = tokio::fs::read_to_string(&self.path).await?;
            self.entries = serde_json::from_str(&content)?;
            info!(
                "Replaying {} recorded operations from {}",
                self.entries.len(),
                self.path.display()
            );
        }

        Ok(())
    }

    /// Run `operation` and remember its result under `key`, or in replay
    /// mode return the result recorded under `key` without running it.
    pub async fn record<T, F, Fut>(&mut self, key: &ReplayKey, operation: F) -> BotResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = BotResult<T>>,
    {
        let key = key.to_string();

        if self.is_replaying() {
            let value = self
                .entries
                .get(&key)
                .ok_or_else(|| Error::MissingReplayKey(key.clone()))?;
            debug!("Replaying {}", key);
            return Ok(serde_json::from_value(value.clone())?);
        }

        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateReplayKey(key));
        }

        let result = operation().await?;
        self.entries.insert(key, serde_json::to_value(&result)?);
        Ok(result)
    }

    /// Finish a run, writing everything recorded to the replay file.
    /// Does nothing while replaying.
    pub async fn end_run(&self) -> BotResult<()> {
        if self.is_replaying() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.entries.serialize(&mut serializer)?;

        tokio::fs::write(&self.path, buffer).await?;
        debug!(
            "Recorded {} operations to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
