mod actor;
mod handle;
pub mod models;
pub mod time;

pub use actor::{events_from_response, events_url};
pub use handle::GoogleCalendarHandle;
pub use models::CalendarEvent;
