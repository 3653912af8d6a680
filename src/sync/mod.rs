//! Calendar to sheet reconciliation.
//!
//! A sweep walks the configured calendar/sheet pairs in order. For each pair
//! the [`reconciler::Reconciler`] fetches the calendar events of the current
//! [`window::TimeWindow`] and the rows of the sheet (both through the
//! [`replay::ReplayRecorder`]), keeps the rows near the window, and appends
//! every event that no row matches according to [`matcher::is_same`].

pub mod matcher;
pub mod reconciler;
pub mod reminders;
pub mod replay;
pub mod run_loop;
pub mod window;

pub use reconciler::Reconciler;
pub use replay::{ReplayKey, ReplayMode, ReplayOperation, ReplayRecorder};
pub use run_loop::{RunLoop, Services};
pub use window::{TimeWindow, WindowSettings};
