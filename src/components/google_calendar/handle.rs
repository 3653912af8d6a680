use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::CalendarEvent;
use crate::components::google_auth::TokenManager;
use crate::components::{Component, EventSource};
use crate::error::BotResult;
use crate::sync::window::TimeWindow;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(token_manager: TokenManager) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(token_manager);

        // Spawn a task to run the actor
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
impl EventSource for GoogleCalendarHandle {
    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>> {
        self.actor_handle.list_events(calendar_id, window).await
    }
}

#[async_trait]
impl Component for GoogleCalendarHandle {
    fn name(&self) -> &'static str {
        "google_calendar"
    }

    async fn shutdown(&self) -> BotResult<()> {
        GoogleCalendarHandle::shutdown(self).await
    }
}
