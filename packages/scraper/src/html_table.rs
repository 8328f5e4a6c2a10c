//! HTML table extraction.
//!
//! Reads every `<table>` in a page into a grid of trimmed cell strings and
//! picks the first one whose header row normalizes into GMP rows. Tables are
//! recognised by their header vocabulary, not their position or markup.

use std::sync::LazyLock;

use ipo_gmp_models::NormalizedRow;
use scraper::{ElementRef, Html, Selector};

use crate::normalize;

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

/// A table as a grid of trimmed cell strings. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Wraps a grid, or returns `None` if it lacks a header plus at least
    /// one data row.
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Option<Self> {
        (rows.len() >= 2).then_some(Self { rows })
    }

    /// The header row.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.rows[0]
    }

    /// Every row after the header.
    #[must_use]
    pub fn data(&self) -> &[Vec<String>] {
        &self.rows[1..]
    }

    /// Normalizes the data rows against the header, oldest first.
    #[must_use]
    pub fn normalize(&self) -> Vec<NormalizedRow> {
        normalize::normalize_rows(self.header(), self.data())
    }
}

/// Collapses the text content of an element into a trimmed string.
fn cell_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join("").trim().to_owned()
}

/// Reads every table in the document, in document order. Rows without any
/// cells are skipped and tables with fewer than two rows are discarded.
#[must_use]
pub fn parse_tables(document: &Html) -> Vec<RawTable> {
    document
        .select(&TABLE_SEL)
        .enumerate()
        .filter_map(|(idx, table)| {
            let rows: Vec<Vec<String>> = table
                .select(&ROW_SEL)
                .map(|row| row.select(&CELL_SEL).map(|el| cell_text(&el)).collect())
                .filter(|cells: &Vec<String>| !cells.is_empty())
                .collect();
            let raw = RawTable::new(rows);
            if raw.is_none() {
                log::debug!("Discarding table {idx}: fewer than two rows");
            }
            raw
        })
        .collect()
}

/// Returns the rows of the first table that yields any GMP rows, together
/// with that table's position among the retained tables.
///
/// Scanning stops at the first match. `None` means no table qualified.
#[must_use]
pub fn extract(document: &Html) -> Option<(usize, Vec<NormalizedRow>)> {
    parse_tables(document)
        .iter()
        .enumerate()
        .map(|(idx, table)| (idx, table.normalize()))
        .find(|(_, rows)| !rows.is_empty())
}
