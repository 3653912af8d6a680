use crate::error::BotResult;
use crate::sync::window::TimeWindow;
use async_trait::async_trait;
use std::fmt;
use tracing::{error, info};

// Export components
pub mod dry_run;
pub mod google_auth;
pub mod google_calendar;
pub mod google_sheets;
pub mod line_messaging;

pub use google_calendar::{CalendarEvent, GoogleCalendarHandle};
pub use google_sheets::{GoogleSheetsHandle, NewRow, SpreadsheetRow};

/// Source of calendar events for one calendar
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the titled events of `calendar_id` that fall inside `window`
    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> BotResult<Vec<CalendarEvent>>;
}

/// Source of the existing rows of a sheet
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every row of the sheet, unfiltered
    async fn fetch_rows(&self, sheet_title: &str) -> BotResult<Vec<SpreadsheetRow>>;
}

/// Destination for rows missing from a sheet
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append all rows in one batch, returning how many were written
    async fn append_rows(&self, sheet_title: &str, rows: &[NewRow]) -> BotResult<usize>;
}

/// Outbound push messages
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, target_id: &str, text: &str) -> BotResult<()>;
}

/// Send a message, logging and swallowing any failure.
///
/// Returns whether the message went out.
pub async fn notify(messenger: &dyn Messenger, target_id: &str, text: &str) -> bool {
    match messenger.send_message(target_id, text).await {
        Ok(()) => {
            info!("Message sent successfully");
            true
        }
        Err(e) => {
            error!("Error sending message: {}", e);
            false
        }
    }
}

/// Component trait for the long-lived actors behind the collaborators
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Shutdown the component
    async fn shutdown(&self) -> BotResult<()>;
}

/// Manager for all components
#[derive(Default)]
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_count", &self.components.len())
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component
    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Names of the registered components, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Shutdown all components
    pub async fn shutdown_all(&self) -> BotResult<()> {
        info!("Shutting down all components");

        for component in &self.components {
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                // Log error but continue with other components
                error!(
                    "Error shutting down component {}: {:?}",
                    component.name(),
                    e
                );
            }
        }

        Ok(())
    }
}
