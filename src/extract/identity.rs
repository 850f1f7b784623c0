//! URL-derived listing identity: absolute URL, id, and title.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

static LISTING_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-ID([A-Za-z0-9]+)\.html").expect("valid regex"));
static TITLE_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/?#]+?)-CID\d+").expect("valid regex"));

const FALLBACK_ID_WIDTH: usize = 16;

/// Resolves `href` (absolute, root-relative or protocol-relative) against the site origin.
pub(crate) fn absolute_url(base: &Url, href: &str) -> Option<String> {
    let joined = base.join(href.trim()).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Canonical `-ID<token>.html` suffix, or a truncated SHA-256 of the URL.
///
/// The fallback must not depend on a per-process hash seed: ids are
/// persisted and compared across restarts.
pub(crate) fn listing_id(url: &str) -> String {
    LISTING_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or_else(|| fallback_id(url), |m| m.as_str().to_string())
}

fn fallback_id(url: &str) -> String {
    let mut digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest.truncate(FALLBACK_ID_WIDTH);
    digest
}

/// Title from the slug between the listing-path marker and `-CID<n>`.
/// Normalized URLs carry the slug percent-encoded; it is decoded first.
pub(crate) fn title_from_url(url: &str, marker: &str) -> Option<String> {
    let start = url.find(marker)? + marker.len();
    let slug = TITLE_SLUG_RE.captures(&url[start..])?.get(1)?.as_str();
    let slug = percent_decode_str(slug).decode_utf8_lossy();
    let title = title_case(&slug.replace('-', " "));
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.olx.pl/").unwrap()
    }

    #[test]
    fn resolves_relative_and_protocol_relative_links() {
        assert_eq!(
            absolute_url(&base(), "/d/oferta/x-CID99-IDab.html").as_deref(),
            Some("https://www.olx.pl/d/oferta/x-CID99-IDab.html")
        );
        assert_eq!(
            absolute_url(&base(), "//m.olx.pl/d/oferta/x.html").as_deref(),
            Some("https://m.olx.pl/d/oferta/x.html")
        );
        assert_eq!(
            absolute_url(&base(), "https://www.otodom.pl/pl/oferta/y").as_deref(),
            Some("https://www.otodom.pl/pl/oferta/y")
        );
        assert_eq!(absolute_url(&base(), "javascript:void(0)"), None);
    }

    #[test]
    fn extracts_canonical_id() {
        let url = "https://www.olx.pl/d/oferta/iphone-13-128gb-CID99-IDZk3pQ.html?reason=x";
        assert_eq!(listing_id(url), "Zk3pQ");
    }

    #[test]
    fn fallback_id_is_stable_and_fixed_width() {
        let url = "https://www.olx.pl/d/oferta/no-canonical-suffix";
        let first = listing_id(url);
        assert_eq!(first.len(), FALLBACK_ID_WIDTH);
        assert_eq!(first, listing_id(url));
        assert_ne!(first, listing_id("https://www.olx.pl/d/oferta/other"));
        // sha256("abc") starts with ba7816bf8f01cfea
        assert_eq!(fallback_id("abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn title_comes_from_slug() {
        let url = "https://www.olx.pl/d/oferta/iphone-15-PRO-max-256gb-CID99-IDabc.html";
        assert_eq!(
            title_from_url(url, "/oferta/").as_deref(),
            Some("Iphone 15 Pro Max 256Gb")
        );
    }

    #[test]
    fn title_handles_polish_letters() {
        let url = absolute_url(&base(), "/d/oferta/żółty-telefon-CID99-IDabc.html").unwrap();
        assert!(url.contains("%C5%BC"));
        assert_eq!(
            title_from_url(&url, "/oferta/").as_deref(),
            Some("Żółty Telefon")
        );
    }

    #[test]
    fn title_missing_without_category_marker() {
        assert_eq!(
            title_from_url("https://www.olx.pl/d/oferta/iphone-IDabc.html", "/oferta/"),
            None
        );
        assert_eq!(title_from_url("https://www.olx.pl/x-CID99", "/oferta/"), None);
    }
}
