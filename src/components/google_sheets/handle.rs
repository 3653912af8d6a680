use super::actor::{GoogleSheetsActor, GoogleSheetsActorHandle};
use super::models::{NewRow, SpreadsheetRow};
use crate::components::google_auth::TokenManager;
use crate::components::{Component, RowSink, RowSource};
use crate::error::BotResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Sheets actor of one document
#[derive(Clone)]
pub struct GoogleSheetsHandle {
    actor_handle: GoogleSheetsActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleSheetsHandle {
    /// Create a new GoogleSheetsHandle and spawn the actor
    pub fn new(spreadsheet_id: String, token_manager: TokenManager) -> Self {
        let (mut actor, handle) = GoogleSheetsActor::new(spreadsheet_id, token_manager);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl RowSource for GoogleSheetsHandle {
    async fn fetch_rows(&self, sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>> {
        self.actor_handle.fetch_rows(sheet_title).await
    }
}

#[async_trait]
impl RowSink for GoogleSheetsHandle {
    async fn append_rows(&self, sheet_title: &str, rows: &[NewRow]) -> BotResult<usize> {
        self.actor_handle.append_rows(sheet_title, rows.to_vec()).await
    }
}

#[async_trait]
impl Component for GoogleSheetsHandle {
    fn name(&self) -> &'static str {
        "google_sheets"
    }

    async fn shutdown(&self) -> BotResult<()> {
        GoogleSheetsHandle::shutdown(self).await
    }
}
