use super::models::{NewRow, SpreadsheetRow};
use crate::components::google_auth::TokenManager;
use crate::error::{append_error, fetch_error, BotResult, Error};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Columns every reconciled sheet must have in its header row
const REQUIRED_COLUMNS: [&str; 2] = ["Student", "Start"];

/// The Google Sheets actor that processes messages
pub struct GoogleSheetsActor {
    spreadsheet_id: String,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleSheetsCommand>,
}

/// Commands that can be sent to the Google Sheets actor
pub enum GoogleSheetsCommand {
    FetchRows {
        sheet_title: String,
        response_tx: mpsc::Sender<BotResult<Vec<SpreadsheetRow>>>,
    },
    AppendRows {
        sheet_title: String,
        rows: Vec<NewRow>,
        response_tx: mpsc::Sender<BotResult<usize>>,
    },
    Shutdown,
}

/// Handle for communicating with the Google Sheets actor
#[derive(Clone)]
pub struct GoogleSheetsActorHandle {
    command_tx: mpsc::Sender<GoogleSheetsCommand>,
}

impl GoogleSheetsActorHandle {
    /// Fetch all data rows of a sheet
    pub async fn fetch_rows(&self, sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleSheetsCommand::FetchRows {
                sheet_title: sheet_title.to_string(),
                response_tx,
            })
            .await
            .map_err(|e| fetch_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| fetch_error("Response channel closed"))?
    }

    /// Append rows below the existing data of a sheet
    pub async fn append_rows(&self, sheet_title: &str, rows: Vec<NewRow>) -> BotResult<usize> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleSheetsCommand::AppendRows {
                sheet_title: sheet_title.to_string(),
                rows,
                response_tx,
            })
            .await
            .map_err(|e| append_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| append_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(GoogleSheetsCommand::Shutdown).await;
        Ok(())
    }
}

impl GoogleSheetsActor {
    /// Create a new actor and return its handle
    pub fn new(
        spreadsheet_id: String,
        token_manager: TokenManager,
    ) -> (Self, GoogleSheetsActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            spreadsheet_id,
            token_manager,
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleSheetsActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Sheets actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleSheetsCommand::FetchRows {
                    sheet_title,
                    response_tx,
                } => {
                    let result = self.fetch_rows(&sheet_title).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleSheetsCommand::AppendRows {
                    sheet_title,
                    rows,
                    response_tx,
                } => {
                    let result = self.append_rows(&sheet_title, &rows).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleSheetsCommand::Shutdown => {
                    info!("Google Sheets actor shutting down");
                    break;
                }
            }
        }

        info!("Google Sheets actor shut down");
    }

    async fn fetch_rows(&self, sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>> {
        debug!("Getting rows from sheet {}...", sheet_title);
        let url = self.values_url(&sheet_range(sheet_title), None)?;
        let values = self.send(self.client.get(url), fetch_error).await?;
        rows_from_values(sheet_title, &values)
    }

    async fn append_rows(&self, sheet_title: &str, rows: &[NewRow]) -> BotResult<usize> {
        // Header decides which column each value lands in
        let header_url = self.values_url(&format!("{}!1:1", sheet_range(sheet_title)), None)?;
        let header_values = self.send(self.client.get(header_url), append_error).await?;
        let header = header_row(&header_values);
        if header.is_empty() {
            return Err(append_error(&format!("Sheet {} has no header row", sheet_title)));
        }

        let mut url = self.values_url(&sheet_range(sheet_title), Some(":append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = append_body(&header, rows);
        let response = self
            .send(self.client.post(url).json(&body), append_error)
            .await?;

        Ok(updated_rows(&response))
    }

    fn values_url(&self, range: &str, suffix: Option<&str>) -> BotResult<Url> {
        let mut url = Url::parse(SHEETS_BASE_URL)
            .map_err(|e| fetch_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| fetch_error("Sheets URL cannot have path segments"))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix.unwrap_or("")));
        Ok(url)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        to_error: fn(&str) -> Error,
    ) -> BotResult<Value> {
        let access_token = self.token_manager.get_token().await?;

        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| to_error(&format!("Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(to_error(&format!(
                "Sheets request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| to_error(&format!("Failed to parse Sheets response: {}", e)))
    }
}

/// A1 range covering a whole sheet, quoted so any title is valid
pub fn sheet_range(sheet_title: &str) -> String {
    format!("'{}'", sheet_title.replace('\'', "''"))
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First row of a `values` response
pub fn header_row(values: &Value) -> Vec<String> {
    values
        .get("values")
        .and_then(|v| v.as_array())
        .and_then(|rows| rows.first())
        .and_then(|row| row.as_array())
        .map(|row| row.iter().map(|c| cell_text(c).trim().to_string()).collect())
        .unwrap_or_default()
}

/// Turn a `values` response into rows keyed by the header row
pub fn rows_from_values(sheet_title: &str, values: &Value) -> BotResult<Vec<SpreadsheetRow>> {
    let header = header_row(values);
    if header.is_empty() {
        return Err(fetch_error(&format!("Sheet {} has no header row", sheet_title)));
    }

    let column = |name: &str| header.iter().position(|h| h == name);
    for name in REQUIRED_COLUMNS {
        if column(name).is_none() {
            return Err(fetch_error(&format!(
                "Sheet {} has no {} column",
                sheet_title, name
            )));
        }
    }
    let student_col = column("Student");
    let start_col = column("Start");

    let data_rows = values
        .get("values")
        .and_then(|v| v.as_array())
        .map(|rows| &rows[1..])
        .unwrap_or_default();

    let rows = data_rows
        .iter()
        .map(|row| {
            let cells = row.as_array();
            let cell = |index: Option<usize>| {
                index
                    .and_then(|i| cells.and_then(|c| c.get(i)))
                    .map(cell_text)
                    .filter(|s| !s.is_empty())
            };
            SpreadsheetRow {
                student: cell(student_col),
                start: cell(start_col),
            }
        })
        .collect();

    Ok(rows)
}

/// Request body appending `rows` in header order
pub fn append_body(header: &[String], rows: &[NewRow]) -> Value {
    let values: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| header.iter().map(|h| row.cell(h)).collect())
        .collect();
    json!({ "majorDimension": "ROWS", "values": values })
}

/// Number of rows an append call reports as written
pub fn updated_rows(response: &Value) -> usize {
    response
        .get("updates")
        .and_then(|u| u.get("updatedRows"))
        .and_then(|n| n.as_u64())
        .unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_range_quotes_title() {
        assert_eq!(sheet_range("Lessons"), "'Lessons'");
        assert_eq!(sheet_range("Bob's lessons"), "'Bob''s lessons'");
    }

    #[test]
    fn test_rows_from_values() {
        let values = json!({
            "range": "'Lessons'!A1:D4",
            "values": [
                ["Start", "End", "Student", "Paid"],
                ["2024/03/01 10:00:00", "2024/03/01 11:00:00", "Alice", "yes"],
                ["2024/03/02 10:00:00"],
                [],
                ["", "", "Carol"]
            ]
        });

        let rows = rows_from_values("Lessons", &values).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            SpreadsheetRow {
                student: Some("Alice".to_string()),
                start: Some("2024/03/01 10:00:00".to_string()),
            }
        );
        assert_eq!(rows[1].student, None);
        assert_eq!(rows[1].start.as_deref(), Some("2024/03/02 10:00:00"));
        assert_eq!(rows[2], SpreadsheetRow::default());
        assert_eq!(rows[3].student.as_deref(), Some("Carol"));
        assert_eq!(rows[3].start, None);
    }

    #[test]
    fn test_rows_from_values_header_only() {
        let values = json!({"values": [["Student", "Start", "End"]]});
        assert!(rows_from_values("Lessons", &values).unwrap().is_empty());
    }

    #[test]
    fn test_rows_from_values_requires_header() {
        assert!(rows_from_values("Lessons", &json!({"range": "'Lessons'!A1:Z1000"})).is_err());

        let values = json!({"values": [["Name", "When"]]});
        assert!(matches!(
            rows_from_values("Lessons", &values),
            Err(Error::Fetch(_))
        ));
    }

    #[test]
    fn test_append_body_follows_header() {
        let header = vec![
            "End".to_string(),
            "Notes".to_string(),
            "Student".to_string(),
            "Start".to_string(),
        ];
        let rows = vec![NewRow {
            student: "Alice".to_string(),
            start: "2024/03/01 10:00:00".to_string(),
            end: "No end date".to_string(),
        }];

        let body = append_body(&header, &rows);
        assert_eq!(
            body["values"],
            json!([["No end date", "", "Alice", "2024/03/01 10:00:00"]])
        );
    }

    #[test]
    fn test_updated_rows() {
        let response = json!({"updates": {"updatedRange": "'Lessons'!A5:C6", "updatedRows": 2}});
        assert_eq!(updated_rows(&response), 2);
        assert_eq!(updated_rows(&json!({})), 0);
    }
}
