//! Marketplace-specific tuning data. The site's markup drifts, so every
//! selector and keyword lives here rather than in the extraction logic.

#[derive(Debug, Clone)]
pub struct SelectorTable {
    /// Tried in order; the first one that yields a listing-bearing element wins.
    pub containers: Vec<String>,
    /// Path fragment that identifies a listing link.
    pub listing_path_marker: String,
    /// Class substrings that mark an ancestor as a listing card.
    pub container_keywords: Vec<String>,
    /// Upper bound on ancestors inspected when climbing from a bare link.
    pub max_ancestor_depth: usize,
    pub price: Vec<String>,
    /// Elements whose text reads "<place> - <date>" or just "<place>".
    pub location: Vec<String>,
    pub image: Vec<String>,
    pub image_attrs: Vec<String>,
    /// Query parameter kept when stripping image query strings.
    pub image_id_param: Option<String>,
    pub date: Vec<String>,
    pub known_places: Vec<String>,
}

impl Default for SelectorTable {
    fn default() -> Self {
        let owned =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| (*s).to_string()).collect() };
        Self {
            containers: owned(&[
                r#"[data-cy="l-card"]"#,
                r#"[data-testid="l-card"]"#,
                r#"[data-testid*="listing"]"#,
                r#"div[class*="listing"]"#,
                r#"div[class*="offer"]"#,
                r#"div[class*="card"]"#,
                r#"li[class*="item"]"#,
            ]),
            listing_path_marker: "/oferta/".to_string(),
            container_keywords: owned(&["listing", "offer", "card", "item"]),
            max_ancestor_depth: 5,
            price: owned(&[
                r#"[data-testid="ad-price"]"#,
                r#"p[class*="price"]"#,
                r#"span[class*="price"]"#,
                ".price",
            ]),
            location: owned(&[
                r#"[data-testid="location-date"]"#,
                r#"p[class*="location"]"#,
                r#"span[class*="location"]"#,
            ]),
            image: owned(&["img"]),
            image_attrs: owned(&["src", "data-src", "data-lazy-src", "data-original"]),
            image_id_param: Some("id".to_string()),
            date: owned(&[
                r#"[data-testid="location-date"]"#,
                r#"p[class*="date"]"#,
                r#"span[class*="date"]"#,
                "time",
            ]),
            known_places: owned(KNOWN_PLACES),
        }
    }
}

const KNOWN_PLACES: &[&str] = &[
    "Warszawa",
    "Kraków",
    "Gdańsk",
    "Wrocław",
    "Poznań",
    "Łódź",
    "Szczecin",
    "Bydgoszcz",
    "Lublin",
    "Katowice",
    "Białystok",
    "Gdynia",
    "Częstochowa",
    "Radom",
    "Sosnowiec",
    "Toruń",
    "Kielce",
    "Gliwice",
    "Zabrze",
    "Bytom",
    "Olsztyn",
    "Bielsko-Biała",
    "Rzeszów",
    "Ruda Śląska",
    "Rybnik",
    "Tychy",
    "Dąbrowa Górnicza",
    "Płock",
    "Elbląg",
    "Opole",
    "Gorzów Wielkopolski",
    "Włocławek",
    "Zielona Góra",
    "Tarnów",
    "Chorzów",
    "Kalisz",
    "Koszalin",
    "Legnica",
    "Grudziądz",
    "Słupsk",
    "Jaworzno",
    "Jastrzębie-Zdrój",
    "Jelenia Góra",
    "Nowy Sącz",
    "Konin",
    "Piotrków Trybunalski",
    "Lubin",
    "Inowrocław",
    "Ostrów Wielkopolski",
    "Stargard",
    "Mysłowice",
    "Piła",
    "Siedlce",
    "Mielec",
    "Gniezno",
    "Głogów",
    "Tarnobrzeg",
    "Pruszków",
    "Racibórz",
    "Skierniewice",
    "Kutno",
    "Otwock",
    "Żywiec",
    "Wejherowo",
    "Pabianice",
    "Świdnica",
    "Łomża",
    "Świnoujście",
    "Kołobrzeg",
    "Ostrołęka",
    "Stalowa Wola",
    "Grodzisk Mazowiecki",
    "Kłodzko",
    "Brzesko",
];
