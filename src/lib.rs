//! Polls an OLX search page and forwards listings published today to a
//! webhook, once each.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod health;
pub mod listing;
pub mod notify;
pub mod poller;
pub mod recency;
pub mod seen;

pub use config::Config;
pub use error::SniperError;
pub use extract::{Extractor, SelectorTable};
pub use health::{Liveness, RunningGuard};
pub use listing::ListingRecord;
pub use notify::Notifier;
pub use poller::{CycleReport, PollState, Poller};
pub use seen::SeenSet;

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Loads `ini.env`, then `.env`, into the process environment if present.
pub fn load_env_files() {
    dotenvy::from_filename("ini.env").ok();
    dotenvy::dotenv().ok();
}
