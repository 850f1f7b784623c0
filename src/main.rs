use anyhow::Result;
use olx_sniper::{Config, Liveness, Poller};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    olx_sniper::load_env_files();
    olx_sniper::init_tracing();

    let config = Config::from_env()?;
    let liveness = Liveness::default();
    let port = config.port;

    let bot_liveness = liveness.clone();
    let bot = tokio::spawn(async move {
        match Poller::new(config, bot_liveness) {
            Ok(poller) => poller.run().await,
            Err(e) => error!(error = %e, "poll loop not started"),
        }
    });

    let served = olx_sniper::health::serve(port, liveness).await;
    bot.abort();
    served?;
    Ok(())
}
