//! Per-field cascades: table selectors first, then pattern scans over text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[ \u{a0}]?\d{3})*(?:[,.]\d{1,2})?[ \u{a0}]*(?:zł|PLN|€|\$)")
        .expect("valid regex")
});

static LOCATION_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\p{L}[\p{L} ,\-]*?)[ \u{a0}]*-[ \u{a0}]*(?:dzisiaj|wczoraj|odświeżono|\d{1,2}\.\d{1,2}\.\d{4}|\d{1,2} \p{L}+ \d{4})",
    )
    .expect("valid regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:odświeżono[ \u{a0}]+(?:dnia[ \u{a0}]+)?)?(?:dzisiaj(?:[ \u{a0}]+o[ \u{a0}]+\d{1,2}:\d{2})?|wczoraj(?:[ \u{a0}]+o[ \u{a0}]+\d{1,2}:\d{2})?|\d{1,2}\.\d{1,2}\.\d{4}|\d{1,2}[ \u{a0}]+(?:stycznia|lutego|marca|kwietnia|maja|czerwca|lipca|sierpnia|września|października|listopada|grudnia)[ \u{a0}]+\d{4})",
    )
    .expect("valid regex")
});

pub(crate) struct FieldSelectors {
    pub price: Vec<Selector>,
    pub location: Vec<Selector>,
    pub image: Vec<Selector>,
    pub date: Vec<Selector>,
}

/// Text nodes of `el`, trimmed and one per line. Lines keep the pattern
/// scans from matching across unrelated fragments.
pub(crate) fn text_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_selected_text(container: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        container
            .select(sel)
            .map(|el| squash(&el.text().collect::<Vec<_>>().join(" ")))
            .find(|t| !t.is_empty())
    })
}

fn find_price(text: &str) -> Option<String> {
    PRICE_RE.find(text).map(|m| squash(m.as_str()))
}

pub(crate) fn price(
    container: ElementRef<'_>,
    scopes: &[ElementRef<'_>],
    selectors: &FieldSelectors,
) -> Option<String> {
    first_selected_text(container, &selectors.price)
        .map(|text| find_price(&text).unwrap_or(text))
        .or_else(|| scopes.iter().find_map(|s| find_price(&text_lines(*s))))
}

/// "Brzesko - Dzisiaj o 10:32" → "Brzesko".
fn place_part(text: &str) -> Option<String> {
    let place = text.split_once(" - ").map_or(text, |(place, _)| place).trim();
    (!place.is_empty()).then(|| place.to_string())
}

fn find_location(text: &str) -> Option<String> {
    LOCATION_DATE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(['-', ',']).trim().to_string())
        .filter(|place| !place.is_empty())
}

fn known_place(text: &str, places: &[String]) -> Option<String> {
    let haystack = text.to_lowercase();
    places
        .iter()
        .find(|place| haystack.contains(&place.to_lowercase()))
        .cloned()
}

pub(crate) fn location(
    container: ElementRef<'_>,
    scopes: &[ElementRef<'_>],
    selectors: &FieldSelectors,
    known_places: &[String],
) -> Option<String> {
    first_selected_text(container, &selectors.location)
        .and_then(|text| place_part(&text))
        .or_else(|| scopes.iter().find_map(|s| find_location(&text_lines(*s))))
        .or_else(|| {
            scopes
                .iter()
                .find_map(|s| known_place(&text_lines(*s), known_places))
        })
}

fn find_date(text: &str) -> Option<String> {
    DATE_RE.find(text).map(|m| squash(m.as_str()))
}

/// "Brzesko - Dzisiaj o 10:32" → "Dzisiaj o 10:32"; bare dates are matched by pattern.
fn date_part(text: &str) -> Option<String> {
    match text.split_once(" - ") {
        Some((_, date)) if !date.trim().is_empty() => Some(date.trim().to_string()),
        _ => find_date(text),
    }
}

pub(crate) fn publish_date(
    container: ElementRef<'_>,
    scopes: &[ElementRef<'_>],
    selectors: &FieldSelectors,
) -> Option<String> {
    first_selected_text(container, &selectors.date)
        .and_then(|text| date_part(&text))
        .or_else(|| scopes.iter().find_map(|s| find_date(&text_lines(*s))))
}

fn image_source<'a>(img: ElementRef<'a>, attrs: &[String]) -> Option<&'a str> {
    attrs.iter().find_map(|attr| {
        img.value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.starts_with("data:"))
    })
}

/// Absolute image URL with the query string dropped, except `keep_param`.
fn clean_image_url(base: &Url, src: &str, keep_param: Option<&str>) -> Option<String> {
    let mut url = base.join(src).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let kept = keep_param.and_then(|name| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
    });
    url.set_query(None);
    url.set_fragment(None);
    if let Some((k, v)) = kept {
        url.query_pairs_mut().append_pair(&k, &v);
    }
    Some(url.to_string())
}

pub(crate) fn image(
    scopes: &[ElementRef<'_>],
    selectors: &FieldSelectors,
    attrs: &[String],
    keep_param: Option<&str>,
    base: &Url,
) -> Option<String> {
    scopes
        .iter()
        .find_map(|scope| {
            selectors
                .image
                .iter()
                .find_map(|sel| scope.select(sel).find_map(|img| image_source(img, attrs)))
        })
        .and_then(|src| clean_image_url(base, src, keep_param))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn sels() -> FieldSelectors {
        let parse = |s: &[&str]| -> Vec<Selector> {
            s.iter().map(|x| Selector::parse(x).unwrap()).collect()
        };
        FieldSelectors {
            price: parse(&[r#"[data-testid="ad-price"]"#]),
            location: parse(&[r#"[data-testid="location-date"]"#]),
            image: parse(&["img"]),
            date: parse(&[r#"[data-testid="location-date"]"#]),
        }
    }

    fn attrs() -> Vec<String> {
        ["src", "data-src", "data-lazy-src", "data-original"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.select(&Selector::parse("div.card").unwrap()).next().unwrap()
    }

    #[test]
    fn price_prefers_selector_and_trims_suffix_text() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><p data-testid="ad-price">1 200 zł<span>do negocjacji</span></p></div>"#,
        );
        let card = root(&doc);
        assert_eq!(price(card, &[card], &sels()).as_deref(), Some("1 200 zł"));
    }

    #[test]
    fn price_falls_back_to_text_scan_without_crossing_lines() {
        let doc = Html::parse_fragment(
            "<div class=\"card\"><h6>iPhone 13</h6><p>2\u{a0}499,99\u{a0}zł</p></div>",
        );
        let card = root(&doc);
        assert_eq!(price(card, &[card], &sels()).as_deref(), Some("2 499,99 zł"));
    }

    #[test]
    fn price_absent_when_nothing_matches() {
        let doc = Html::parse_fragment(r#"<div class="card"><h6>Zamienię</h6></div>"#);
        let card = root(&doc);
        assert_eq!(price(card, &[card], &sels()), None);
    }

    #[test]
    fn location_and_date_split_from_combined_element() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><p data-testid="location-date">Brzesko - Dzisiaj o 10:32</p></div>"#,
        );
        let card = root(&doc);
        let s = sels();
        assert_eq!(location(card, &[card], &s, &[]).as_deref(), Some("Brzesko"));
        assert_eq!(
            publish_date(card, &[card], &s).as_deref(),
            Some("Dzisiaj o 10:32")
        );
    }

    #[test]
    fn location_pattern_scan_handles_hyphenated_names() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><span>850 zł</span><span>Bielsko-Biała - 12.10.2024</span></div>"#,
        );
        let card = root(&doc);
        assert_eq!(
            location(card, &[card], &sels(), &[]).as_deref(),
            Some("Bielsko-Biała")
        );
        assert_eq!(
            publish_date(card, &[card], &sels()).as_deref(),
            Some("12.10.2024")
        );
    }

    #[test]
    fn location_falls_back_to_known_places() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><span>Odbiór osobisty: KRAKÓW Nowa Huta</span></div>"#,
        );
        let card = root(&doc);
        let places = vec!["Warszawa".to_string(), "Kraków".to_string()];
        assert_eq!(
            location(card, &[card], &sels(), &places).as_deref(),
            Some("Kraków")
        );
    }

    #[test]
    fn date_scan_recognises_month_names_and_refresh_prefix() {
        let doc = Html::parse_fragment(
            r#"<div class="card"><span>Odświeżono dnia 17 października 2024</span></div>"#,
        );
        let card = root(&doc);
        assert_eq!(
            publish_date(card, &[card], &sels()).as_deref(),
            Some("Odświeżono dnia 17 października 2024")
        );
    }

    #[test]
    fn date_absent_when_no_marker() {
        let doc = Html::parse_fragment(r#"<div class="card"><span>Warszawa</span></div>"#);
        let card = root(&doc);
        assert_eq!(publish_date(card, &[card], &sels()), None);
    }

    #[test]
    fn image_uses_attribute_priority_and_strips_query() {
        let doc = Html::parse_fragment(
            r#"<div class="card">
                 <img src="data:image/gif;base64,AAAA" data-src="/img/photo.jpg?s=200x0&amp;id=77&amp;q=50">
               </div>"#,
        );
        let card = root(&doc);
        let base = Url::parse("https://www.olx.pl/").unwrap();
        assert_eq!(
            image(&[card], &sels(), &attrs(), Some("id"), &base).as_deref(),
            Some("https://www.olx.pl/img/photo.jpg?id=77")
        );
        assert_eq!(
            image(&[card], &sels(), &attrs(), None, &base).as_deref(),
            Some("https://www.olx.pl/img/photo.jpg")
        );
    }

    #[test]
    fn image_absent_without_usable_source() {
        let doc = Html::parse_fragment(r#"<div class="card"><img alt="x"></div>"#);
        let card = root(&doc);
        let base = Url::parse("https://www.olx.pl/").unwrap();
        assert_eq!(image(&[card], &sels(), &attrs(), None, &base), None);
    }
}
