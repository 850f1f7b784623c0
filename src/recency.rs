//! Recency allow-list over the free-text publish marker.
//!
//! Only a "today" marker, or an explicit date equal to the current date,
//! lets a listing through. Missing or unrecognised markers are stale.

use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Month, OffsetDateTime};

use crate::listing::ListingRecord;

const TODAY_MARKER: &str = "dzisiaj";
const YESTERDAY_MARKER: &str = "wczoraj";

const MONTHS_GENITIVE: [&str; 12] = [
    "stycznia",
    "lutego",
    "marca",
    "kwietnia",
    "maja",
    "czerwca",
    "lipca",
    "sierpnia",
    "września",
    "października",
    "listopada",
    "grudnia",
];

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").expect("valid regex")
});
static NAMED_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[ \u{a0}]+(\p{L}+)[ \u{a0}]+(\d{4})\b").expect("valid regex")
});

/// Whether a listing with this marker was published on `today`.
#[must_use]
pub fn is_from_today(publish_date: Option<&str>, today: Date) -> bool {
    let Some(text) = publish_date else {
        return false;
    };
    let text = text.to_lowercase();
    if text.contains(TODAY_MARKER) {
        return true;
    }
    if text.contains(YESTERDAY_MARKER) {
        return false;
    }
    explicit_date(&text).is_some_and(|date| date == today)
}

fn explicit_date(text: &str) -> Option<Date> {
    if let Some(caps) = NUMERIC_DATE_RE.captures(text) {
        let month: u8 = caps[2].parse().ok()?;
        return calendar_date(&caps[3], Month::try_from(month).ok()?, &caps[1]);
    }
    let caps = NAMED_DATE_RE.captures(text)?;
    let index = MONTHS_GENITIVE.iter().position(|m| *m == &caps[2])?;
    let month = Month::try_from(u8::try_from(index + 1).ok()?).ok()?;
    calendar_date(&caps[3], month, &caps[1])
}

fn calendar_date(year: &str, month: Month, day: &str) -> Option<Date> {
    Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()
}

/// Keeps records published today, in their original order.
#[must_use]
pub fn filter_recent(records: Vec<ListingRecord>, today: Date) -> Vec<ListingRecord> {
    records
        .into_iter()
        .filter(|r| is_from_today(r.publish_date.as_deref(), today))
        .collect()
}

/// Current calendar date in the host's local offset, UTC when the offset is unknown.
#[must_use]
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
