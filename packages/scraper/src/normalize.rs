//! Row normalization.
//!
//! Maps free-text table headers to the canonical [`Column`] vocabulary,
//! coerces raw cells into dates and numbers, and orders rows
//! chronologically.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ipo_gmp_models::{Column, NormalizedRow};
use regex::Regex;

/// Characters removed from numeric cells before parsing.
const NUMERIC_NOISE: &[char] = &['₹', '%', ','];

/// Leading decimal number, mirroring lenient float parsing of cells such as
/// `"35 (8.75%)"`.
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").expect("valid regex")
});

/// Maps a table header cell to its canonical column.
///
/// Matching is case-insensitive and mostly substring-based. The rules are
/// checked in order and the first match wins.
#[must_use]
pub fn classify_header(raw: &str) -> Option<Column> {
    let lower = raw.trim().to_lowercase();

    if lower == "date" || lower.contains("gmp date") {
        return Some(Column::Date);
    }
    if contains_any(&lower, &["ipo price", "issue price"]) {
        return Some(Column::IpoPrice);
    }
    if lower == "gmp" || lower.contains("grey market premium") {
        return Some(Column::Gmp);
    }
    if lower.contains("estimated listing price") {
        return Some(Column::EstimatedListingPrice);
    }
    if contains_any(&lower, &["estimated listing gains", "listing gains", "gain"]) {
        return Some(Column::EstimatedListingGains);
    }
    None
}

/// Returns `true` if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Canonical column → cell index for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: BTreeMap<Column, usize>,
}

impl ColumnMap {
    /// Builds the map from a header row. When several headers map to the
    /// same column, the left-most one is kept.
    #[must_use]
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Self {
        let mut indices = BTreeMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(column) = classify_header(cell.as_ref()) {
                indices.entry(column).or_insert(idx);
            }
        }
        Self { indices }
    }

    /// Cell index of `column`, if a header matched it.
    #[must_use]
    pub fn get(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    /// Whether a header matched `column`.
    #[must_use]
    pub fn contains(&self, column: Column) -> bool {
        self.indices.contains_key(&column)
    }

    /// Whether no header matched at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Matched numeric columns with their indices, in canonical order.
    pub fn numeric(&self) -> impl Iterator<Item = (Column, usize)> + '_ {
        self.indices
            .iter()
            .filter(|(column, _)| column.is_numeric())
            .map(|(column, idx)| (*column, *idx))
    }
}

/// Parses a price or percentage cell.
///
/// Strips the rupee sign, percent signs, and thousands separators, then
/// reads the leading decimal number. Returns `None` for empty or
/// non-numeric cells.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !NUMERIC_NOISE.contains(c)).collect();
    let m = LEADING_NUMBER_RE.find(cleaned.trim())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalizes a date cell to the dash-separated form (`15/01/2024` →
/// `15-01-2024`).
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    raw.trim().replace('/', "-")
}

/// Normalizes the data rows of one table according to its header.
///
/// Returns no rows unless the header maps a [`Column::Date`], since rows
/// cannot be ordered without one. Rows whose date is missing or malformed
/// are dropped. The result is sorted oldest first.
#[must_use]
pub fn normalize_rows<S: AsRef<str>>(header: &[S], data: &[Vec<S>]) -> Vec<NormalizedRow> {
    let columns = ColumnMap::from_header(header);
    let Some(date_idx) = columns.get(Column::Date) else {
        return Vec::new();
    };

    let mut rows: Vec<NormalizedRow> = data
        .iter()
        .filter_map(|cells| {
            let date = normalize_date(cells.get(date_idx)?.as_ref());
            let Some(row) = NormalizedRow::new(date.clone()) else {
                log::debug!("Dropping row with unparseable date '{date}'");
                return None;
            };
            Some(columns.numeric().fold(row, |row, (column, idx)| {
                let value = cells.get(idx).and_then(|cell| parse_number(cell.as_ref()));
                row.with_value(column, value)
            }))
        })
        .collect();

    sort_ascending(&mut rows);
    rows
}

/// Sorts rows oldest first. Rows on the same day keep their relative order.
pub fn sort_ascending(rows: &mut [NormalizedRow]) {
    rows.sort_by_key(NormalizedRow::day);
}

/// Sorts rows newest first. Rows on the same day keep their relative order.
pub fn sort_descending(rows: &mut [NormalizedRow]) {
    rows.sort_by(|a, b| b.day().cmp(&a.day()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_owned()).collect()
    }

    #[test]
    fn classifies_recognised_headers() {
        assert_eq!(classify_header("GMP Date"), Some(Column::Date));
        assert_eq!(classify_header(" date "), Some(Column::Date));
        assert_eq!(classify_header("IPO Price (₹)"), Some(Column::IpoPrice));
        assert_eq!(classify_header("Issue Price"), Some(Column::IpoPrice));
        assert_eq!(classify_header("GMP"), Some(Column::Gmp));
        assert_eq!(classify_header("Grey Market Premium"), Some(Column::Gmp));
        assert_eq!(
            classify_header("Estimated Listing Price"),
            Some(Column::EstimatedListingPrice)
        );
        assert_eq!(
            classify_header("Estimated Listing Gains"),
            Some(Column::EstimatedListingGains)
        );
        assert_eq!(classify_header("Gain %"), Some(Column::EstimatedListingGains));
    }

    #[test]
    fn rejects_unrelated_headers() {
        assert_eq!(classify_header("IPO Date"), None);
        assert_eq!(classify_header("GMP (₹)"), None);
        assert_eq!(classify_header("Subscription"), None);
        assert_eq!(classify_header(""), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "gmp date" is checked before the GMP rule.
        assert_eq!(classify_header("Last GMP Date"), Some(Column::Date));
        // "ipo price" is checked before "gain".
        assert_eq!(classify_header("IPO Price Gain"), Some(Column::IpoPrice));
    }

    #[test]
    fn column_map_keeps_left_most_duplicate() {
        let map = ColumnMap::from_header(&["Date", "GMP", "Grey Market Premium"]);
        assert_eq!(map.get(Column::Date), Some(0));
        assert_eq!(map.get(Column::Gmp), Some(1));
        assert!(!map.contains(Column::IpoPrice));
        assert!(ColumnMap::from_header(&["Name", "Lot Size"]).is_empty());
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_number("₹1,234.50"), Some(1234.5));
        assert_eq!(parse_number("12.5%"), Some(12.5));
        assert_eq!(parse_number("  ₹ 35 "), Some(35.0));
        assert_eq!(parse_number("35 (8.75%)"), Some(35.0));
        assert_eq!(parse_number("-5"), Some(-5.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("₹-"), None);
        assert_eq!(parse_number("N/A"), None);
    }

    #[test]
    fn normalizes_date_separators() {
        assert_eq!(normalize_date(" 15/01/2024 "), "15-01-2024");
        assert_eq!(normalize_date("15-01-2024"), "15-01-2024");
    }

    #[test]
    fn normalized_rows_are_sorted_ascending() {
        let header = strings(&["GMP Date", "GMP"]);
        let data = vec![
            strings(&["15-01-2024", "30"]),
            strings(&["01/01/2024", "20"]),
            strings(&["20-01-2024", "40"]),
        ];
        let rows = normalize_rows(&header, &data);
        let dates: Vec<&str> = rows.iter().map(NormalizedRow::date).collect();
        assert_eq!(dates, vec!["01-01-2024", "15-01-2024", "20-01-2024"]);
        assert_eq!(rows[0].value(Column::Gmp), Some(20.0));
    }

    #[test]
    fn absent_columns_are_omitted_and_bad_cells_are_null() {
        let header = strings(&["Date", "GMP", "Subscription"]);
        let data = vec![strings(&["01-02-2024", "-"])];
        let rows = normalize_rows(&header, &data);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].has(Column::Gmp));
        assert_eq!(rows[0].value(Column::Gmp), None);
        assert!(!rows[0].has(Column::IpoPrice));
    }

    #[test]
    fn rows_without_valid_date_are_dropped() {
        let header = strings(&["Date", "GMP"]);
        let data = vec![
            strings(&["Total", "10"]),
            strings(&[]),
            strings(&["03-02-2024", "12"]),
        ];
        let rows = normalize_rows(&header, &data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date(), "03-02-2024");
    }

    #[test]
    fn table_without_date_column_yields_nothing() {
        let header = strings(&["IPO Price", "GMP"]);
        let data = vec![strings(&["100", "10"])];
        assert!(normalize_rows(&header, &data).is_empty());
    }

    #[test]
    fn descending_sort_reverses_dates() {
        let mut rows: Vec<NormalizedRow> = ["01-01-2024", "20-01-2024", "15-01-2024"]
            .into_iter()
            .filter_map(NormalizedRow::new)
            .collect();
        sort_descending(&mut rows);
        let dates: Vec<&str> = rows.iter().map(NormalizedRow::date).collect();
        assert_eq!(dates, vec!["20-01-2024", "15-01-2024", "01-01-2024"]);
    }
}
