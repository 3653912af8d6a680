use calendar_to_sheet::components::line_messaging::LineClient;
use calendar_to_sheet::components::GoogleCalendarHandle;
use calendar_to_sheet::error::{config_error, BotResult};
use calendar_to_sheet::startup;
use calendar_to_sheet::sync::reminders::send_todays_reminders;
use chrono::Local;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;
    run().await.map_err(Into::into)
}

async fn run() -> BotResult<()> {
    let config = calendar_to_sheet::config::Config::load()?;

    let token = config
        .line_channel_access_token
        .clone()
        .ok_or_else(|| config_error("LINE_CHANNEL_ACCESS_TOKEN is required to send reminders"))?;
    let target_id = config
        .line_target_id
        .clone()
        .ok_or_else(|| config_error("LINE_TARGET_ID is required to send reminders"))?;

    let calendar = GoogleCalendarHandle::new(startup::token_manager(&config)?);
    let messenger = LineClient::new(token);

    let calendar_ids: Vec<String> = config
        .calendar_sheet_configs
        .iter()
        .map(|pair| pair.calendar_id.clone())
        .collect();

    let delivered = send_todays_reminders(
        &calendar,
        &messenger,
        &calendar_ids,
        &target_id,
        &Local::now(),
    )
    .await;

    calendar.shutdown().await?;

    info!("Sent {} reminders", delivered?);
    Ok(())
}
