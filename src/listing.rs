pub const PRICE_PLACEHOLDER: &str = "Cena do uzgodnienia";
pub const LOCATION_PLACEHOLDER: &str = "Brak";
pub const TITLE_PLACEHOLDER: &str = "Ogłoszenie na OLX";

/// One posting recovered from a search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub price: String,
    pub location: String,
    pub image: Option<String>,
    /// Raw recency marker as shown on the page, e.g. "Dzisiaj o 11:49".
    pub publish_date: Option<String>,
}
