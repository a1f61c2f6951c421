//! Release calendar extraction from HTML tables.
//!
//! Columns are recognized from header text, so the same code reads theater
//! and OTT calendars regardless of column order.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::text::{clean_text, element_text, resolve_url, split_list};

/// One row of a release calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedRelease {
    pub movie_name: String,
    pub release_date: NaiveDate,
    pub language_hint: Option<String>,
    pub platform: Option<String>,
    /// Free text from a type/format column ("Web Series", "Film").
    pub content_type_hint: Option<String>,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: Option<String>,
    pub poster_url: Option<String>,
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Title,
    Date,
    Language,
    Platform,
    Genre,
    Cast,
    Director,
    Type,
}

/// Classify a header cell. Order matters: "OTT Release Date" is a date.
fn classify_header(text: &str) -> Option<Column> {
    let h = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| h.contains(*w));
    if has(&["date", "release", "premiere", "streaming from"]) {
        Some(Column::Date)
    } else if has(&["language", "lang"]) {
        Some(Column::Language)
    } else if has(&["platform", "ott", "streaming", "channel"]) {
        Some(Column::Platform)
    } else if has(&["genre"]) {
        Some(Column::Genre)
    } else if has(&["cast", "starring", "actors", "stars"]) {
        Some(Column::Cast)
    } else if has(&["director", "directed"]) {
        Some(Column::Director)
    } else if has(&["type", "format", "category"]) {
        Some(Column::Type)
    } else if has(&["movie", "title", "film", "name", "show", "series"]) {
        Some(Column::Title)
    } else {
        None
    }
}

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static IMG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Extract release rows from every table that has title and date columns.
/// Rows without a title or a parseable date are skipped.
pub fn parse_release_tables(doc: &Html, base: &Url) -> Vec<ScrapedRelease> {
    let mut releases = Vec::new();

    for table in doc.select(&TABLE_SEL) {
        let mut rows = table.select(&ROW_SEL);
        let Some(header) = rows.next() else {
            continue;
        };
        let columns: Vec<Option<Column>> = header
            .select(&CELL_SEL)
            .map(|cell| classify_header(&element_text(&cell)))
            .collect();
        if !columns.contains(&Some(Column::Title)) || !columns.contains(&Some(Column::Date)) {
            tracing::debug!(?columns, "table without title/date columns skipped");
            continue;
        }

        for row in rows {
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SEL).collect();
            let cell_text = |col: Column| -> Option<String> {
                let idx = columns.iter().position(|c| *c == Some(col))?;
                let text = element_text(cells.get(idx)?);
                (!text.is_empty() && text != "-").then_some(text)
            };

            let Some(movie_name) = cell_text(Column::Title) else {
                continue;
            };
            let Some(release_date) = cell_text(Column::Date).and_then(|d| parse_release_date(&d))
            else {
                tracing::debug!(%movie_name, "release row without a parseable date");
                continue;
            };

            let poster_url = row
                .select(&IMG_SEL)
                .filter_map(|img| img.value().attr("data-src").or(img.value().attr("src")))
                .find_map(|src| resolve_url(base, src))
                .map(|u| u.to_string());

            releases.push(ScrapedRelease {
                movie_name,
                release_date,
                language_hint: cell_text(Column::Language),
                platform: cell_text(Column::Platform),
                content_type_hint: cell_text(Column::Type),
                genres: cell_text(Column::Genre).map(|g| split_list(&g)).unwrap_or_default(),
                cast: cell_text(Column::Cast).map(|c| split_list(&c)).unwrap_or_default(),
                director: cell_text(Column::Director),
                poster_url,
                source_url: base.to_string(),
            });
        }
    }

    releases
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

static PARENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

static SEPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bsept\b").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Parse a release date. Numeric dates are day first (`12/10/2026` is
/// 12 October).
pub fn parse_release_date(text: &str) -> Option<NaiveDate> {
    let without_parens = PARENS_RE.replace_all(text, " ");
    let without_ordinals = ORDINAL_RE.replace_all(&without_parens, "$1");
    let without_sept = SEPT_RE.replace_all(&without_ordinals, "Sep");
    let normalized = clean_text(&without_sept.replace(',', " "));

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}
