//! Text-pattern extraction for pages without a usable table.
//!
//! Some GMP pages render the history as styled blocks rather than a
//! `<table>`. This module finds the GMP section heading and applies a
//! fixed-order row pattern (date, IPO price, GMP, estimated listing price,
//! gains %) to the section's text.
//!
//! The pattern assumes that column order. A page that lists the values in a
//! different order is not recognised.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use ipo_gmp_models::{Column, NormalizedRow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::{parse_number, sort_ascending};

/// Phrase identifying the GMP section heading.
pub const HEADING_MARKER: &str = "GMP Grey Market Premium";

static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3").expect("valid selector"));

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<date>\d{2}-\d{2}-\d{4})\s*",
        r"₹?\s*(?P<ipo_price>[\d,]+(?:\.\d+)?)\s*",
        r"₹?\s*(?P<gmp>[\d,]+(?:\.\d+)?)\s*",
        r"₹?\s*(?P<listing_price>[\d,]+(?:\.\d+)?)\s*",
        r"(?P<gains>[\d.]+)\s*%",
    ))
    .expect("valid regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Capture group → canonical column, in pattern order.
const GROUPS: &[(&str, Column)] = &[
    ("ipo_price", Column::IpoPrice),
    ("gmp", Column::Gmp),
    ("listing_price", Column::EstimatedListingPrice),
    ("gains", Column::EstimatedListingGains),
];

/// Joins the text nodes below `el` with single spaces.
fn spaced_text(el: &ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts GMP rows from the section under the GMP heading.
///
/// Returns `None` if the page has no such heading, otherwise the matched
/// rows (possibly empty), oldest first.
#[must_use]
pub fn extract(document: &Html) -> Option<Vec<NormalizedRow>> {
    let heading = document.select(&HEADING_SEL).find(|h| {
        WHITESPACE_RE
            .replace_all(&spaced_text(h), " ")
            .contains(HEADING_MARKER)
    })?;

    let container = heading
        .parent()
        .and_then(ElementRef::wrap)
        .unwrap_or(heading);

    Some(extract_from_text(&spaced_text(&container)))
}

/// Applies the row pattern to `text`, left to right.
///
/// Later matches for an already-seen date are discarded. The result is
/// sorted oldest first.
#[must_use]
pub fn extract_from_text(text: &str) -> Vec<NormalizedRow> {
    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();

    for caps in ROW_RE.captures_iter(text) {
        let date = &caps["date"];
        if !seen.insert(date.to_owned()) {
            continue;
        }
        let Some(row) = NormalizedRow::new(date) else {
            log::debug!("Skipping text match with invalid date '{date}'");
            continue;
        };
        let row = GROUPS.iter().fold(row, |row, (group, column)| {
            let value = caps.name(group).and_then(|m| parse_number(m.as_str()));
            row.with_value(*column, value)
        });
        rows.push(row);
    }

    log::debug!("Text pattern matched {} GMP rows", rows.len());

    sort_ascending(&mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_PAGE: &str = r#"
        <html><body>
          <div class="article">
            <h2>Patel Retail IPO  GMP Grey Market Premium</h2>
            <div class="row"><span>21-08-2025</span><span>₹255</span><span>₹35</span>
              <span>₹290</span><span>13.73%</span></div>
            <div class="row"><span>19-08-2025</span><span>₹255</span><span>₹1,030.5</span>
              <span>₹1,285.5</span><span>404.12 %</span></div>
            <div class="row"><span>21-08-2025</span><span>₹255</span><span>₹99</span>
              <span>₹354</span><span>38.82%</span></div>
          </div>
          <p>22-08-2025 ₹255 ₹40 ₹295 15.69%</p>
        </body></html>
    "#;

    #[test]
    fn extracts_rows_under_heading() {
        let document = Html::parse_document(BLOCK_PAGE);
        let rows = extract(&document).unwrap();

        let dates: Vec<&str> = rows.iter().map(NormalizedRow::date).collect();
        assert_eq!(dates, vec!["19-08-2025", "21-08-2025"]);

        assert_eq!(rows[0].value(Column::IpoPrice), Some(255.0));
        assert_eq!(rows[0].value(Column::Gmp), Some(1030.5));
        assert_eq!(rows[0].value(Column::EstimatedListingPrice), Some(1285.5));
        assert_eq!(rows[0].value(Column::EstimatedListingGains), Some(404.12));
    }

    #[test]
    fn duplicate_dates_keep_first_occurrence() {
        let document = Html::parse_document(BLOCK_PAGE);
        let rows = extract(&document).unwrap();
        let latest = rows.last().unwrap();
        assert_eq!(latest.date(), "21-08-2025");
        assert_eq!(latest.value(Column::Gmp), Some(35.0));
    }

    #[test]
    fn none_without_heading() {
        let document = Html::parse_document(
            "<div><h2>Subscription Status</h2><p>21-08-2025 ₹255 ₹35 ₹290 13.73%</p></div>",
        );
        assert!(extract(&document).is_none());
    }

    #[test]
    fn heading_without_rows_yields_empty() {
        let document = Html::parse_document(
            "<section><h3>GMP Grey Market Premium</h3><p>Updated soon.</p></section>",
        );
        assert_eq!(extract(&document), Some(Vec::new()));
    }

    #[test]
    fn pattern_requires_fixed_column_order() {
        // Percentage first: the row is not recognised.
        assert!(extract_from_text("21-08-2025 13.73% ₹255 ₹35 ₹290").is_empty());
        assert_eq!(extract_from_text("21-08-2025 ₹255 ₹35 ₹290 13.73%").len(), 1);
    }
}
