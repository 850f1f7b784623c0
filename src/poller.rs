//! Poll loop: fetch → extract → recency filter → diff against the seen set
//! → notify → persist → sleep with jitter.
//!
//! The first successful cycle after start is a baseline: everything found is
//! marked seen and nothing is sent. Every later cycle notifies only ids the
//! seen set does not hold, and marks an id only after its delivery succeeded.

use std::time::Duration;

use rand::{Rng, rng};
use time::Date;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::SniperError;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::health::Liveness;
use crate::listing::ListingRecord;
use crate::notify::Notifier;
use crate::recency::{filter_recent, local_today};
use crate::seen::{SEEN_CEILING, SEEN_KEEP, SeenSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Next successful cycle seeds the seen set without notifying.
    Baseline,
    Polling,
}

/// What one cycle did; mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub extracted: usize,
    pub recent: usize,
    pub baselined: usize,
    pub candidates: usize,
    pub notified: usize,
    pub failed: usize,
    pub trimmed: bool,
}

pub struct Poller {
    config: Config,
    fetcher: Fetcher,
    extractor: Extractor,
    notifier: Notifier,
    seen: SeenSet,
    state: PollState,
    liveness: Liveness,
}

impl Poller {
    /// Validates the configuration and loads the persisted seen set.
    ///
    /// # Errors
    ///
    /// [`SniperError::MissingWebhook`] when no webhook is configured; client
    /// or selector construction errors otherwise.
    pub fn new(config: Config, liveness: Liveness) -> Result<Self, SniperError> {
        let notifier = Notifier::from_config(&config)?;
        let fetcher = Fetcher::new(&config)?;
        let extractor = Extractor::with_defaults(config.base_origin())?;
        let seen = SeenSet::load(config.seen_file.clone());
        let state = if config.notify_on_start {
            PollState::Polling
        } else {
            PollState::Baseline
        };
        Ok(Self {
            config,
            fetcher,
            extractor,
            notifier,
            seen,
            state,
            liveness,
        })
    }

    #[must_use]
    pub fn state(&self) -> PollState {
        self.state
    }

    #[must_use]
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    fn matches_keywords(&self, listing: &ListingRecord) -> bool {
        if self.config.keywords.is_empty() {
            return true;
        }
        let title = listing.title.to_lowercase();
        self.config.keywords.iter().any(|k| title.contains(k.as_str()))
    }

    /// Runs one cycle against `today`'s date.
    ///
    /// # Errors
    ///
    /// Fetch failures ([`SniperError::Http`], [`SniperError::UnexpectedStatus`]).
    /// Notification failures are counted in the report, not returned.
    pub async fn run_cycle(&mut self, today: Date) -> Result<CycleReport, SniperError> {
        let html = self.fetcher.fetch_page().await?;
        let extracted = self.extractor.extract(&html);
        let mut report = CycleReport {
            extracted: extracted.len(),
            ..CycleReport::default()
        };
        if extracted.is_empty() {
            info!("no listings found on page");
            return Ok(report);
        }

        let mut listings = filter_recent(extracted, today);
        listings.retain(|l| self.matches_keywords(l));
        report.recent = listings.len();

        if self.state == PollState::Baseline {
            report.baselined = self.seen.mark_all(listings.iter().map(|l| l.id.clone()));
            self.state = PollState::Polling;
            info!(
                marked = report.baselined,
                "first run complete; current listings marked as seen"
            );
            return Ok(report);
        }

        // The cap bounds deliveries per cycle; new ids past it stay unmarked for the next one.
        let candidates: Vec<ListingRecord> = listings
            .into_iter()
            .filter(|l| self.seen.is_new(&l.id))
            .take(self.config.max_results)
            .collect();
        report.candidates = candidates.len();

        for (i, listing) in candidates.iter().enumerate() {
            info!(id = %listing.id, title = %listing.title, url = %listing.url, "new listing");
            match self.notifier.notify(listing).await {
                Ok(_) => {
                    self.seen.mark_seen(&listing.id);
                    report.notified += 1;
                    if i + 1 < candidates.len() {
                        sleep(self.config.notify_pause).await;
                    }
                }
                Err(e) => {
                    error!(id = %listing.id, error = %e, "failed to notify; will retry next cycle");
                    report.failed += 1;
                }
            }
        }

        report.trimmed = self.seen.enforce_bound(SEEN_CEILING, SEEN_KEEP);
        Ok(report)
    }

    /// Polls until the process exits. Cycle errors are logged, never fatal.
    pub async fn run(mut self) {
        let _running = self.liveness.mark_running();
        info!(
            url = %self.config.search_url,
            interval_secs = self.config.poll_interval_secs,
            state = ?self.state,
            "starting OLX sniper"
        );
        if !self.fetcher.robots_allowed().await {
            warn!(url = %self.config.search_url, "robots.txt disallows the search URL");
        }

        loop {
            match self.run_cycle(local_today()).await {
                Ok(report) if report.candidates > 0 => info!(
                    new = report.candidates,
                    notified = report.notified,
                    failed = report.failed,
                    total = report.extracted,
                    "cycle complete"
                ),
                Ok(report) => info!(
                    total = report.extracted,
                    today = report.recent,
                    "no new listings"
                ),
                Err(e) => error!(error = %e, "poll cycle failed"),
            }
            sleep(jittered_interval(self.config.poll_interval_secs)).await;
        }
    }
}

/// `base + jitter - base/10`, floored at one second.
fn interval_with_jitter(base_secs: u64, jitter_secs: u64) -> u64 {
    base_secs
        .saturating_add(jitter_secs)
        .saturating_sub(base_secs / 10)
        .max(1)
}

/// Poll interval with up to `base/5` seconds of random jitter.
#[must_use]
pub fn jittered_interval(base_secs: u64) -> Duration {
    let jitter = rng().random_range(0..=(base_secs / 5).max(1));
    Duration::from_secs(interval_with_jitter(base_secs, jitter))
}
