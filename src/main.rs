use calendar_to_sheet::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar-to-sheet");

    // Load configuration
    let config = startup::load_config()?;

    // Run the sync loop
    startup::start_sync(config).await
}
