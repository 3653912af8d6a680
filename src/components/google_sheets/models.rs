use serde::{Deserialize, Serialize};

/// The two columns of a sheet row the reconciliation looks at.
///
/// Serialized with the sheet's own column names, which is also how rows
/// appear in the replay file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpreadsheetRow {
    #[serde(rename = "Student", default)]
    pub student: Option<String>,
    #[serde(rename = "Start", default)]
    pub start: Option<String>,
}

/// A row to append for a calendar event missing from the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRow {
    #[serde(rename = "Student")]
    pub student: String,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "End")]
    pub end: String,
}

impl NewRow {
    /// Value for a header cell, empty for columns this service does not fill
    pub fn cell(&self, header: &str) -> &str {
        match header.trim() {
            "Student" => &self.student,
            "Start" => &self.start,
            "End" => &self.end,
            _ => "",
        }
    }
}
