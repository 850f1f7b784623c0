//! Sends one sample listing through the configured webhook.

use anyhow::{Context, Result};
use olx_sniper::{Config, ListingRecord, Notifier};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    olx_sniper::load_env_files();
    olx_sniper::init_tracing();

    let config = Config::from_env()?;
    let notifier =
        Notifier::from_config(&config).context("set DISCORD_WEBHOOK_URL in ini.env or .env")?;

    let sample = ListingRecord {
        id: "test".to_string(),
        title: "Test Listing - iPhone 15 Pro".to_string(),
        url: config.search_url.to_string(),
        price: "4500 zł".to_string(),
        location: "Warszawa".to_string(),
        image: None,
        publish_date: Some("Dzisiaj".to_string()),
    };

    let attempts = notifier
        .notify(&sample)
        .await
        .context("sending test webhook failed")?;
    info!(attempts, "test webhook sent; check the channel");
    Ok(())
}
