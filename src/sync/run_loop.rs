use crate::components::{EventSource, RowSink, RowSource};
use crate::config::{CalendarSheetConfig, Config};
use crate::error::BotResult;
use crate::sync::reconciler::Reconciler;
use crate::sync::replay::{ReplayKey, ReplayOperation, ReplayRecorder};
use crate::sync::window::{TimeWindow, WindowSettings};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

/// The collaborators a sweep talks to
#[derive(Clone)]
pub struct Services {
    pub events: Arc<dyn EventSource>,
    pub rows: Arc<dyn RowSource>,
    pub sink: Arc<dyn RowSink>,
}

/// Repeats a sweep over every configured pair, forever, with a fixed delay
/// between sweeps
pub struct RunLoop {
    pairs: Vec<CalendarSheetConfig>,
    window: WindowSettings,
    interval: Duration,
    paused: bool,
    services: Services,
    recorder: ReplayRecorder,
    clock: fn() -> DateTime<Utc>,
}

impl RunLoop {
    pub fn new(config: &Config, services: Services, recorder: ReplayRecorder) -> BotResult<Self> {
        Ok(Self {
            pairs: config.calendar_sheet_configs.clone(),
            window: config.window_settings()?,
            interval: config.run_interval(),
            paused: config.service_paused,
            services,
            recorder,
            clock: Utc::now,
        })
    }

    /// Use another source of "now" for window calculation
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn recorder(&self) -> &ReplayRecorder {
        &self.recorder
    }

    /// Run until the process is stopped. Returns at once when paused.
    pub async fn run(&mut self) -> BotResult<()> {
        self.run_sweeps(None).await.map(|_| ())
    }

    /// Run at most `limit` sweeps (unbounded for `None`), returning how many ran
    pub async fn run_sweeps(&mut self, limit: Option<usize>) -> BotResult<usize> {
        if self.paused {
            info!("Service paused, exiting");
            return Ok(0);
        }

        let mut sweeps = 0;
        loop {
            info!("Running iteration...");
            match self.sweep().await {
                Ok(appended) => info!("Iteration appended {} rows", appended),
                Err(e) => error!("Iteration failed: {}", e),
            }
            sweeps += 1;

            if limit.is_some_and(|limit| sweeps >= limit) {
                return Ok(sweeps);
            }

            info!("Finished iteration. Waiting {}ms", self.interval.as_millis());
            sleep(self.interval).await;
        }
    }

    /// Reconcile every pair in order, stopping at the first failure.
    ///
    /// The whole sweep is one replay run; what was recorded is persisted
    /// even when a pair fails. Each pair's window is recorded too, so a
    /// replay filters rows exactly as the recorded sweep did.
    pub async fn sweep(&mut self) -> BotResult<usize> {
        self.recorder.start_run().await?;
        let result = self.reconcile_pairs().await;
        let persisted = self.recorder.end_run().await;

        let appended = result?;
        persisted?;
        Ok(appended)
    }

    async fn reconcile_pairs(&mut self) -> BotResult<usize> {
        let reconciler = Reconciler::new(
            self.services.events.as_ref(),
            self.services.rows.as_ref(),
            self.services.sink.as_ref(),
        );

        let mut appended = 0;
        for pair in &self.pairs {
            info!("Adding events for {} {}", pair.calendar_id, pair.sheet_title);
            let now = (self.clock)();
            let settings = self.window;
            let window_key =
                ReplayKey::new(ReplayOperation::TimeWindow, &pair.calendar_id, &pair.sheet_title);
            let window: TimeWindow = self
                .recorder
                .record(&window_key, || async move { TimeWindow::around(now, &settings) })
                .await?;
            appended += reconciler
                .reconcile(
                    &mut self.recorder,
                    &pair.calendar_id,
                    &pair.sheet_title,
                    &window,
                )
                .await?;
        }

        Ok(appended)
    }
}
