use crate::components::dry_run::DryRunSink;
use crate::components::google_auth::{
    TokenManager, CALENDAR_EVENTS_SCOPE, CALENDAR_SCOPE, SPREADSHEETS_SCOPE,
};
use crate::components::{ComponentManager, GoogleCalendarHandle, GoogleSheetsHandle, RowSink};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use crate::sync::{ReplayMode, ReplayRecorder, RunLoop, Services};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Token manager with every scope the service needs
pub fn token_manager(config: &Config) -> Result<TokenManager, Error> {
    TokenManager::from_credentials(
        &config.google_credentials,
        &[CALENDAR_SCOPE, CALENDAR_EVENTS_SCOPE, SPREADSHEETS_SCOPE],
    )
}

/// Wire up the Google components and run the sync loop until it ends or a
/// shutdown signal arrives
pub async fn start_sync(config: Config) -> miette::Result<()> {
    let token_manager = token_manager(&config)?;
    info!("Using service account {}", token_manager.client_email());

    let calendar = GoogleCalendarHandle::new(token_manager.clone());
    let sheets = GoogleSheetsHandle::new(config.sheet_id.clone(), token_manager);

    let mode = ReplayMode::from_flag(config.replay);
    let sink: Arc<dyn RowSink> = match mode {
        ReplayMode::Replay => {
            info!("Replaying {}, rows will not be written", config.replay_path.display());
            Arc::new(DryRunSink)
        }
        ReplayMode::Record => Arc::new(sheets.clone()),
    };

    let services = Services {
        events: Arc::new(calendar.clone()),
        rows: Arc::new(sheets.clone()),
        sink,
    };
    let recorder = ReplayRecorder::new(mode, config.replay_path.clone());
    let mut run_loop = RunLoop::new(&config, services, recorder)?;

    let mut components = ComponentManager::new();
    components.register(calendar);
    components.register(sheets);
    info!("Registered components: {}", components.names().join(", "));

    // Wait for either the loop to end or a shutdown signal
    let result = tokio::select! {
        result = run_loop.run() => {
            info!("Sync loop ended");
            result
        }
        signal = shutdown::wait_for_signal() => {
            info!("Received shutdown signal, shutting down...");
            signal.map_err(Error::from)
        }
    };

    components.shutdown_all().await?;
    result.map_err(Into::into)
}
