mod actor;
mod handle;
pub mod models;

pub use actor::{append_body, header_row, rows_from_values, sheet_range, updated_rows};
pub use handle::GoogleSheetsHandle;
pub use models::{NewRow, SpreadsheetRow};
