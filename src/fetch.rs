//! Single-attempt fetch of the search page with desktop-browser headers.

use std::time::Duration;

use rand::{Rng, rng};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderName, HeaderValue,
    PRAGMA, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use robotstxt::DefaultMatcher;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::SniperError;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Fetcher {
    client: reqwest::Client,
    search_url: Url,
    user_agent: Option<String>,
}

impl Fetcher {
    /// # Errors
    ///
    /// Returns [`SniperError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, SniperError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(8))
            .timeout(FETCH_TIMEOUT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Accept-Encoding is left to reqwest so responses are decoded transparently.
    fn headers(&self) -> HeaderMap {
        let mut h = HeaderMap::new();
        let ua = self.user_agent.clone().unwrap_or_else(random_desktop_ua);
        if let Ok(value) = HeaderValue::from_str(&ua) {
            h.insert(USER_AGENT, value);
        }
        h.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        h.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("pl-PL,pl;q=0.9,en;q=0.8"),
        );
        h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        h.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        h.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        h.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        h.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("navigate"),
        );
        h.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("document"),
        );
        h
    }

    /// GETs the search page once.
    ///
    /// # Errors
    ///
    /// [`SniperError::Http`] on transport failure, [`SniperError::UnexpectedStatus`]
    /// on any non-2xx response.
    pub async fn fetch_page(&self) -> Result<String, SniperError> {
        let rsp = self
            .client
            .get(self.search_url.as_str())
            .headers(self.headers())
            .send()
            .await?;

        let status = rsp.status();
        let final_url = rsp.url().clone();
        if !status.is_success() {
            return Err(SniperError::UnexpectedStatus {
                status: status.as_u16(),
                url: final_url.to_string(),
            });
        }

        let text = rsp.text().await?;
        debug!(
            url = %self.search_url,
            final_url = %final_url,
            status = status.as_u16(),
            len = text.len(),
            "fetched search page"
        );
        Ok(text)
    }

    /// Checks robots.txt for the search URL. An unreachable robots.txt allows everything.
    pub async fn robots_allowed(&self) -> bool {
        let Ok(robots_url) = self.search_url.join("/robots.txt") else {
            return true;
        };
        let robots_txt = match self
            .client
            .get(robots_url.as_str())
            .headers(self.headers())
            .send()
            .await
        {
            Ok(rsp) if rsp.status().is_success() => rsp.text().await.unwrap_or_default(),
            Ok(_) => String::new(),
            Err(e) => {
                warn!(error = %e, "could not fetch robots.txt");
                String::new()
            }
        };
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&robots_txt, "Mozilla", self.search_url.as_str())
    }
}

fn random_desktop_ua() -> String {
    const UAS: &[&str] = &[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    ];
    let i = rng().random_range(0..UAS.len());
    UAS[i].to_string()
}
