//! Discord-style webhook delivery for one listing.
//!
//! A 429 is retried with exponential backoff from `base_delay`, up to
//! [`MAX_ATTEMPTS`] sends in total. Any other failure stops immediately so
//! the caller can leave the listing unmarked and retry it next cycle.

use std::time::Duration;

use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::SniperError;
use crate::fetch::FETCH_TIMEOUT;
use crate::listing::ListingRecord;

pub const MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_THUMBNAIL: &str = "https://www.olx.pl/favicon.ico";
const EMBED_COLOR: u32 = 3_066_993;
const BOT_USERNAME: &str = "OLX Sniper Bot";
const BUTTON_LABEL: &str = "KUP TERAZ";

pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
    base_delay: Duration,
    max_attempts: u32,
}

impl Notifier {
    /// # Errors
    ///
    /// Returns [`SniperError::Http`] if the HTTP client cannot be built.
    pub fn new(webhook_url: impl Into<String>, base_delay: Duration) -> Result<Self, SniperError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            base_delay,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    /// # Errors
    ///
    /// [`SniperError::MissingWebhook`] when no destination is configured.
    pub fn from_config(config: &Config) -> Result<Self, SniperError> {
        let url = config
            .webhook_url
            .clone()
            .ok_or(SniperError::MissingWebhook)?;
        Self::new(url, config.retry_base_delay)
    }

    /// Host of the webhook, safe to log (the path carries the token).
    fn destination(&self) -> String {
        url::Url::parse(&self.webhook_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "webhook".to_string())
    }

    /// Delivers `listing`, returning the number of sends it took.
    ///
    /// # Errors
    ///
    /// - [`SniperError::RateLimited`] when every attempt was answered with 429.
    /// - [`SniperError::UnexpectedStatus`] on any other non-2xx (not retried).
    /// - [`SniperError::Http`] on transport failure (not retried).
    pub async fn notify(&self, listing: &ListingRecord) -> Result<u32, SniperError> {
        let payload = build_payload(listing, &now_rfc3339());
        let mut delay = self.base_delay;

        for attempt in 1..=self.max_attempts {
            let rsp = self
                .client
                .post(&self.webhook_url)
                .json(&payload)
                .send()
                .await?;
            let status = rsp.status();

            if status.is_success() {
                info!(id = %listing.id, title = %listing.title, attempt, "sent notification");
                return Ok(attempt);
            }

            if status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SniperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: self.destination(),
                });
            }

            if attempt < self.max_attempts {
                warn!(
                    id = %listing.id,
                    attempt,
                    max_attempts = self.max_attempts,
                    delay_secs = delay.as_secs_f32(),
                    "webhook rate limited; backing off"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }

        Err(SniperError::RateLimited {
            url: self.destination(),
            attempts: self.max_attempts,
        })
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Webhook body: one embed plus one link button.
#[must_use]
pub fn build_payload(listing: &ListingRecord, timestamp: &str) -> Value {
    let when = match &listing.publish_date {
        Some(date) => format!("🕒 Dodano: {date}"),
        None => "📦 Dostawa: TAK".to_string(),
    };
    let description = format!(
        "📌 {}\n💰 Cena: {}\n📍 Lokalizacja: {}\n{when}\n🔗 Link do ogłoszenia",
        listing.title, listing.price, listing.location
    );
    let thumbnail = listing.image.as_deref().unwrap_or(DEFAULT_THUMBNAIL);

    json!({
        "content": "",
        "username": BOT_USERNAME,
        "embeds": [{
            "title": listing.title,
            "url": listing.url,
            "color": EMBED_COLOR,
            "timestamp": timestamp,
            "description": description,
            "thumbnail": { "url": thumbnail },
        }],
        "components": [{
            "type": 1,
            "components": [{
                "type": 2,
                "style": 5,
                "label": BUTTON_LABEL,
                "url": listing.url,
                "emoji": { "name": "🔗" },
            }],
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(image: Option<&str>, date: Option<&str>) -> ListingRecord {
        ListingRecord {
            id: "abc".to_string(),
            title: "Iphone 15 Pro".to_string(),
            url: "https://www.olx.pl/d/oferta/iphone-15-pro-CID99-IDabc.html".to_string(),
            price: "3 900 zł".to_string(),
            location: "Warszawa".to_string(),
            image: image.map(str::to_string),
            publish_date: date.map(str::to_string),
        }
    }

    #[test]
    fn payload_carries_embed_and_button() {
        let payload = build_payload(
            &listing(Some("https://img.olx.pl/x.jpg"), Some("Dzisiaj o 10:00")),
            "2024-10-17T10:00:00Z",
        );
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Iphone 15 Pro");
        assert_eq!(
            embed["url"],
            "https://www.olx.pl/d/oferta/iphone-15-pro-CID99-IDabc.html"
        );
        assert_eq!(embed["color"], 3_066_993);
        assert_eq!(embed["timestamp"], "2024-10-17T10:00:00Z");
        assert_eq!(embed["thumbnail"]["url"], "https://img.olx.pl/x.jpg");

        let description = embed["description"].as_str().unwrap();
        assert!(description.contains("💰 Cena: 3 900 zł"));
        assert!(description.contains("📍 Lokalizacja: Warszawa"));
        assert!(description.contains("🕒 Dodano: Dzisiaj o 10:00"));

        let button = &payload["components"][0]["components"][0];
        assert_eq!(button["label"], "KUP TERAZ");
        assert_eq!(button["style"], 5);
        assert_eq!(button["url"], embed["url"]);
    }

    #[test]
    fn payload_falls_back_to_default_icon_and_delivery_note() {
        let payload = build_payload(&listing(None, None), "t");
        let embed = &payload["embeds"][0];
        assert_eq!(embed["thumbnail"]["url"], DEFAULT_THUMBNAIL);
        assert!(
            embed["description"]
                .as_str()
                .unwrap()
                .contains("📦 Dostawa: TAK")
        );
    }

    #[test]
    fn missing_webhook_is_rejected() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(matches!(
            Notifier::from_config(&config),
            Err(SniperError::MissingWebhook)
        ));
    }

    #[test]
    fn destination_hides_token_path() {
        let notifier = Notifier::new(
            "https://discord.com/api/webhooks/123/secret-token",
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(notifier.destination(), "discord.com");
    }
}
