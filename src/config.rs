use crate::error::{config_error, env_error, BotResult};
use crate::sync::window::WindowSettings;
use chrono::Duration;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SECONDS_IN_A_DAY: u64 = 86_400;

/// Default lookback and lookahead, in seconds
pub const DEFAULT_TIME_OFFSET: u64 = SECONDS_IN_A_DAY * 31;

/// Default delay between sweeps, in milliseconds
pub const DEFAULT_RUN_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_REPLAY_PATH: &str = "./replay.json";

/// File consulted for calendar/sheet pairs when the environment has none
pub const PAIRS_FILE: &str = "config/calendar_sheets.toml";

/// One calendar to mirror into one sheet of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSheetConfig {
    pub calendar_id: String,
    pub sheet_title: String,
}

#[derive(Debug, Deserialize)]
struct PairsFile {
    #[serde(default)]
    pairs: Vec<CalendarSheetConfig>,
}

/// Main configuration structure for the service
#[derive(Clone)]
pub struct Config {
    /// Replay the last recorded run instead of calling Google
    pub replay: bool,
    /// Where recorded runs are written and replayed from
    pub replay_path: PathBuf,
    /// Raw service account JSON, handed to the Google token manager untouched
    pub google_credentials: String,
    /// Ordered calendar/sheet pairs processed by every sweep
    pub calendar_sheet_configs: Vec<CalendarSheetConfig>,
    /// Spreadsheet document holding all the sheets
    pub sheet_id: String,
    /// Lookback in seconds
    pub time_offset_start: u64,
    /// Lookahead in seconds
    pub time_offset_end: u64,
    /// Delay between sweeps in milliseconds
    pub run_interval: u64,
    /// Exit without running a single sweep
    pub service_paused: bool,
    pub line_channel_access_token: Option<String>,
    /// LINE user, group or room receiving reminders
    pub line_target_id: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("replay", &self.replay)
            .field("replay_path", &self.replay_path)
            .field("google_credentials", &"<redacted>")
            .field("calendar_sheet_configs", &self.calendar_sheet_configs)
            .field("sheet_id", &self.sheet_id)
            .field("time_offset_start", &self.time_offset_start)
            .field("time_offset_end", &self.time_offset_end)
            .field("run_interval", &self.run_interval)
            .field("service_paused", &self.service_paused)
            .field(
                "line_channel_access_token",
                &self.line_channel_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("line_target_id", &self.line_target_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and the pairs file
    pub fn load() -> BotResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let google_credentials =
            lookup("GOOGLE_CREDENTIALS").ok_or_else(|| env_error("GOOGLE_CREDENTIALS"))?;
        let sheet_id = lookup("SHEET_ID").ok_or_else(|| env_error("SHEET_ID"))?;

        let calendar_sheet_configs = match lookup("CALENDAR_SHEET_CONFIGURATIONS") {
            Some(raw) => parse_pairs_json(&raw)?,
            None => load_pairs_file(Path::new(PAIRS_FILE))?,
        };

        let config = Config {
            replay: is_true(lookup("REPLAY")),
            replay_path: lookup("REPLAY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPLAY_PATH)),
            google_credentials,
            calendar_sheet_configs,
            sheet_id,
            time_offset_start: parse_number(&lookup, "TIME_OFFSET_START", DEFAULT_TIME_OFFSET)?,
            time_offset_end: parse_number(&lookup, "TIME_OFFSET_END", DEFAULT_TIME_OFFSET)?,
            run_interval: parse_number(&lookup, "RUN_INTERVAL", DEFAULT_RUN_INTERVAL_MS)?,
            service_paused: is_true(lookup("SERVICE_PAUSED")),
            line_channel_access_token: lookup("LINE_CHANNEL_ACCESS_TOKEN"),
            line_target_id: lookup("LINE_TARGET_ID"),
        };

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Lookback/lookahead for the time window calculator
    pub fn window_settings(&self) -> BotResult<WindowSettings> {
        Ok(WindowSettings {
            lookback: seconds(self.time_offset_start, "TIME_OFFSET_START")?,
            lookahead: seconds(self.time_offset_end, "TIME_OFFSET_END")?,
        })
    }

    pub fn run_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.run_interval)
    }
}

/// Parse the JSON array form of the calendar/sheet pairs
pub fn parse_pairs_json(raw: &str) -> BotResult<Vec<CalendarSheetConfig>> {
    serde_json::from_str(raw).map_err(|e| {
        config_error(&format!(
            "Invalid CALENDAR_SHEET_CONFIGURATIONS, expected [{{\"calendarId\", \"sheetTitle\"}}]: {}",
            e
        ))
    })
}

/// Read calendar/sheet pairs from a TOML file of `[[pairs]]` tables
pub fn load_pairs_file(path: &Path) -> BotResult<Vec<CalendarSheetConfig>> {
    let content = fs::read_to_string(path).map_err(|_| {
        config_error(&format!(
            "CALENDAR_SHEET_CONFIGURATIONS is not set and {} could not be read",
            path.display()
        ))
    })?;
    let file: PairsFile = toml::from_str(&content)?;
    Ok(file.pairs)
}

fn is_true(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> BotResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| config_error(&format!("Invalid {} format: {}", key, raw))),
        None => Ok(default),
    }
}

fn seconds(value: u64, key: &str) -> BotResult<Duration> {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| config_error(&format!("{} is out of range", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("GOOGLE_CREDENTIALS", "{}"),
            ("SHEET_ID", "doc"),
            ("CALENDAR_SHEET_CONFIGURATIONS", "[]"),
        ]))
        .unwrap();

        assert!(!config.replay);
        assert!(!config.service_paused);
        assert_eq!(config.replay_path, PathBuf::from("./replay.json"));
        assert_eq!(config.time_offset_start, 31 * 86_400);
        assert_eq!(config.time_offset_end, 31 * 86_400);
        assert_eq!(config.run_interval, 60_000);
        assert_eq!(config.run_interval(), std::time::Duration::from_secs(60));
        assert!(config.line_target_id.is_none());
    }

    #[test]
    fn test_pairs_keep_their_order() {
        let config = Config::from_lookup(lookup_from(&[
            ("GOOGLE_CREDENTIALS", "{}"),
            ("SHEET_ID", "doc"),
            (
                "CALENDAR_SHEET_CONFIGURATIONS",
                r#"[{"calendarId":"b@group","sheetTitle":"B"},{"calendarId":"a@group","sheetTitle":"A"}]"#,
            ),
            ("REPLAY", "true"),
            ("SERVICE_PAUSED", "false"),
            ("RUN_INTERVAL", "5000"),
        ]))
        .unwrap();

        assert!(config.replay);
        assert!(!config.service_paused);
        assert_eq!(config.run_interval, 5000);
        let titles: Vec<_> = config
            .calendar_sheet_configs
            .iter()
            .map(|p| p.sheet_title.as_str())
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_missing_required_variable() {
        let result = Config::from_lookup(lookup_from(&[("SHEET_ID", "doc")]));
        assert!(matches!(result, Err(crate::error::Error::Environment(_))));
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_lookup(lookup_from(&[
            ("GOOGLE_CREDENTIALS", "{}"),
            ("SHEET_ID", "doc"),
            ("CALENDAR_SHEET_CONFIGURATIONS", "[]"),
            ("TIME_OFFSET_START", "a month"),
        ]));
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn test_pairs_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.toml");
        fs::write(
            &path,
            "[[pairs]]\ncalendarId = \"cal@group\"\nsheetTitle = \"Lessons\"\n",
        )
        .unwrap();

        let pairs = load_pairs_file(&path).unwrap();
        assert_eq!(
            pairs,
            vec![CalendarSheetConfig {
                calendar_id: "cal@group".to_string(),
                sheet_title: "Lessons".to_string(),
            }]
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            ("GOOGLE_CREDENTIALS", "{\"private_key\":\"secret\"}"),
            ("SHEET_ID", "doc"),
            ("CALENDAR_SHEET_CONFIGURATIONS", "[]"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "line-secret"),
        ]))
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
    }
}
