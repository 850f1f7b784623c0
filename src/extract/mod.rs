//! Listing extraction from a search-results page.
//!
//! Container discovery tries the table's container selectors in order and
//! stops at the first one that matches listing-bearing elements. When none
//! match, every listing link is taken and walked up to a card-like ancestor
//! (bounded by `max_ancestor_depth`), or used as its own container.
//! Each field then runs its own selector-then-pattern cascade.

mod fields;
mod identity;
mod table;

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::SniperError;
use crate::listing::{LOCATION_PLACEHOLDER, ListingRecord, PRICE_PLACEHOLDER, TITLE_PLACEHOLDER};

pub use table::SelectorTable;

use fields::FieldSelectors;

pub struct Extractor {
    table: SelectorTable,
    base: Url,
    containers: Vec<Selector>,
    link: Selector,
    fields: FieldSelectors,
}

fn compile(raw: &str) -> Result<Selector, SniperError> {
    Selector::parse(raw).map_err(|e| SniperError::Selector {
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

fn compile_all(raw: &[String]) -> Result<Vec<Selector>, SniperError> {
    raw.iter().map(|s| compile(s)).collect()
}

impl Extractor {
    /// Compiles every selector in `table` up front.
    ///
    /// # Errors
    ///
    /// Returns [`SniperError::Selector`] naming the first selector that fails to parse.
    pub fn new(table: SelectorTable, base: Url) -> Result<Self, SniperError> {
        let fields = FieldSelectors {
            price: compile_all(&table.price)?,
            location: compile_all(&table.location)?,
            image: compile_all(&table.image)?,
            date: compile_all(&table.date)?,
        };
        Ok(Self {
            containers: compile_all(&table.containers)?,
            link: compile("a[href]")?,
            fields,
            table,
            base,
        })
    }

    /// Extractor over the built-in marketplace table.
    ///
    /// # Errors
    ///
    /// See [`Extractor::new`].
    pub fn with_defaults(base: Url) -> Result<Self, SniperError> {
        Self::new(SelectorTable::default(), base)
    }

    /// Listings in discovery order, unique by id (first occurrence wins).
    #[must_use]
    pub fn extract(&self, html: &str) -> Vec<ListingRecord> {
        let doc = Html::parse_document(html);
        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();

        for (container, link) in self.discover(&doc) {
            if let Some(record) = self.parse_container(container, link) {
                if !register_record(record, &mut records, &mut seen_ids) {
                    debug!("dropped duplicate listing");
                }
            }
        }
        records
    }

    /// (container, listing link) pairs.
    fn discover<'a>(&self, doc: &'a Html) -> Vec<(ElementRef<'a>, ElementRef<'a>)> {
        for (selector, raw) in self.containers.iter().zip(&self.table.containers) {
            let found: Vec<_> = doc
                .select(selector)
                .filter_map(|el| self.card_link(el).map(|link| (el, link)))
                .collect();
            if !found.is_empty() {
                debug!(selector = %raw, count = found.len(), "container selector matched");
                return found;
            }
        }

        let found: Vec<_> = doc
            .select(&self.link)
            .filter(|a| self.is_listing_link(*a))
            .map(|a| (self.climb_to_card(a), a))
            .collect();
        debug!(count = found.len(), "no container selector matched; using link walk");
        found
    }

    fn is_listing_link(&self, a: ElementRef<'_>) -> bool {
        a.value()
            .attr("href")
            .is_some_and(|href| href.contains(&self.table.listing_path_marker))
    }

    fn listing_link<'a>(&self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if container.value().name() == "a" && self.is_listing_link(container) {
            return Some(container);
        }
        container
            .select(&self.link)
            .find(|a| self.is_listing_link(*a))
    }

    /// Listing link of an element that represents exactly one listing.
    fn card_link<'a>(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let link = self.listing_link(el)?;
        let href = link.value().attr("href")?;
        self.single_listing(el, href).then_some(link)
    }

    /// Nearest card-like ancestor that holds no other listing, else the link itself.
    fn climb_to_card<'a>(&self, link: ElementRef<'a>) -> ElementRef<'a> {
        let href = link.value().attr("href").unwrap_or_default();
        link.ancestors()
            .filter_map(ElementRef::wrap)
            .take(self.table.max_ancestor_depth)
            .find(|el| self.has_card_class(*el) && self.single_listing(*el, href))
            .unwrap_or(link)
    }

    fn has_card_class(&self, el: ElementRef<'_>) -> bool {
        el.value().attr("class").is_some_and(|class| {
            let class = class.to_lowercase();
            self.table
                .container_keywords
                .iter()
                .any(|k| class.contains(k.as_str()))
        })
    }

    fn single_listing(&self, el: ElementRef<'_>, href: &str) -> bool {
        el.select(&self.link)
            .filter(|a| self.is_listing_link(*a))
            .all(|a| a.value().attr("href") == Some(href))
    }

    fn parse_container(
        &self,
        container: ElementRef<'_>,
        link: ElementRef<'_>,
    ) -> Option<ListingRecord> {
        let href = link.value().attr("href")?;
        let url = identity::absolute_url(&self.base, href)?;
        let id = identity::listing_id(&url);
        let title = identity::title_from_url(&url, &self.table.listing_path_marker)
            .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

        // A bare link carries little text; its parent and grandparent usually hold
        // the rest, unless they also hold another listing.
        let scopes: Vec<ElementRef<'_>> = if container == link {
            std::iter::once(link)
                .chain(
                    link.ancestors()
                        .filter_map(ElementRef::wrap)
                        .take(2)
                        .take_while(|el| self.single_listing(*el, href)),
                )
                .collect()
        } else {
            vec![container]
        };

        let price = fields::price(container, &scopes, &self.fields);
        let location =
            fields::location(container, &scopes, &self.fields, &self.table.known_places);
        let image = fields::image(
            &scopes,
            &self.fields,
            &self.table.image_attrs,
            self.table.image_id_param.as_deref(),
            &self.base,
        );
        let publish_date = fields::publish_date(container, &scopes, &self.fields);

        debug!(
            %id,
            %title,
            price = price.as_deref().unwrap_or("-"),
            location = location.as_deref().unwrap_or("-"),
            date = publish_date.as_deref().unwrap_or("-"),
            "found listing"
        );

        Some(ListingRecord {
            id,
            title,
            url,
            price: price.unwrap_or_else(|| PRICE_PLACEHOLDER.to_string()),
            location: location.unwrap_or_else(|| LOCATION_PLACEHOLDER.to_string()),
            image,
            publish_date,
        })
    }
}

fn register_record(
    record: ListingRecord,
    records: &mut Vec<ListingRecord>,
    seen: &mut HashSet<String>,
) -> bool {
    if !seen.insert(record.id.clone()) {
        return false;
    }
    records.push(record);
    true
}
