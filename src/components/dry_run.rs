use super::{NewRow, RowSink};
use crate::error::BotResult;
use async_trait::async_trait;
use tracing::info;

/// Sink that only logs, used while replaying so the live sheet stays untouched
#[derive(Debug, Clone, Default)]
pub struct DryRunSink;

#[async_trait]
impl RowSink for DryRunSink {
    async fn append_rows(&self, sheet_title: &str, rows: &[NewRow]) -> BotResult<usize> {
        for row in rows {
            info!(
                sheet = sheet_title,
                student = %row.student,
                start = %row.start,
                end = %row.end,
                "[DRY RUN] Would add row"
            );
        }
        Ok(rows.len())
    }
}
