use super::models::CalendarEvent;
use crate::components::google_auth::TokenManager;
use crate::error::{fetch_error, BotResult};
use crate::sync::window::TimeWindow;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

const EVENTS_BASE_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/";

/// Largest page the events endpoint serves
const MAX_RESULTS: &str = "2500";

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    ListEvents {
        calendar_id: String,
        window: TimeWindow,
        response_tx: mpsc::Sender<BotResult<Vec<CalendarEvent>>>,
    },
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// List the titled events of a calendar inside a window
    pub async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::ListEvents {
                calendar_id: calendar_id.to_string(),
                window: *window,
                response_tx,
            })
            .await
            .map_err(|e| fetch_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| fetch_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(token_manager: TokenManager) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            token_manager,
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::ListEvents {
                    calendar_id,
                    window,
                    response_tx,
                } => {
                    let result = self.list_events(&calendar_id, &window).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        let access_token = self.token_manager.get_token().await?;
        let url = events_url(calendar_id, window)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(&format!(
                "Failed to fetch events from calendar {}: HTTP {} - {}",
                calendar_id, status, error_body
            )));
        }

        let response_data: Value = response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse events response: {}", e)))?;

        let events = events_from_response(&response_data);
        if response_data.get("items").is_none() {
            warn!("Something went wrong fetching events from calendar {}", calendar_id);
        }
        info!("Fetched {} titled events from calendar {}", events.len(), calendar_id);

        Ok(events)
    }
}

/// Build the `events.list` URL for a calendar and window
pub fn events_url(calendar_id: &str, window: &TimeWindow) -> BotResult<Url> {
    let mut url = Url::parse(EVENTS_BASE_URL)
        .map_err(|e| fetch_error(&format!("Failed to parse URL: {}", e)))?;

    url.path_segments_mut()
        .map_err(|_| fetch_error("Calendar URL cannot have path segments"))?
        .pop_if_empty()
        .push(calendar_id)
        .push("events");

    url.query_pairs_mut()
        .append_pair(
            "timeMin",
            &window.start().to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .append_pair(
            "timeMax",
            &window.end().to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .append_pair("singleEvents", "true")
        .append_pair("orderBy", "startTime")
        .append_pair("maxResults", MAX_RESULTS);

    Ok(url)
}

/// Convert an `events.list` response into events, dropping untitled ones
pub fn events_from_response(response_data: &Value) -> Vec<CalendarEvent> {
    let Some(items) = response_data.get("items").and_then(|i| i.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|event| {
            let text = |field: &str| {
                event
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };
            let nested = |outer: &str, inner: &str| {
                event
                    .get(outer)
                    .and_then(|o| o.as_object())
                    .and_then(|o| o.get(inner))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };

            CalendarEvent {
                id: text("id").unwrap_or_default(),
                summary: text("summary"),
                start_date_time: nested("start", "dateTime"),
                start_date: nested("start", "date"),
                end_date_time: nested("end", "dateTime"),
                end_date: nested("end", "date"),
            }
        })
        .filter(CalendarEvent::has_summary)
        .collect()
}
