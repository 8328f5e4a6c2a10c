//! Summary reduction.

use ipo_gmp_models::{Column, LatestRow, NormalizedRow, SummaryRecord, TrendPoint};

use crate::normalize::{sort_ascending, sort_descending};

/// Reduces a normalized history to a [`SummaryRecord`].
///
/// Orders the rows oldest first, keeps the last `window` of them (at least
/// one), orders that tail newest first, and takes the price fields from the
/// row chosen by `latest`. Returns `None` if `rows` is empty.
///
/// Rows on the same day keep their input order, so of two same-day rows at
/// the window edge the later one is kept. Reducing the rows of an earlier
/// summary again yields the same record.
#[must_use]
pub fn reduce(
    mut rows: Vec<NormalizedRow>,
    window: usize,
    latest: LatestRow,
) -> Option<SummaryRecord> {
    sort_ascending(&mut rows);
    let mut rows = rows.split_off(rows.len().saturating_sub(window.max(1)));
    sort_descending(&mut rows);

    let reference = latest.pick(&rows)?;

    Some(SummaryRecord {
        base_ipo_price: reference.value(Column::IpoPrice),
        estimated_listing_price: reference.value(Column::EstimatedListingPrice),
        estimated_listing_gains: reference.value(Column::EstimatedListingGains),
        gmp_trend: rows
            .iter()
            .map(|row| TrendPoint {
                date: row.date().to_owned(),
                gmp: row.value(Column::Gmp),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, gmp: f64, listing: f64) -> NormalizedRow {
        NormalizedRow::new(date)
            .unwrap()
            .with_value(Column::IpoPrice, Some(255.0))
            .with_value(Column::Gmp, Some(gmp))
            .with_value(Column::EstimatedListingPrice, Some(listing))
            .with_value(Column::EstimatedListingGains, Some(gmp / 255.0 * 100.0))
    }

    fn history() -> Vec<NormalizedRow> {
        (1..=6)
            .map(|day| {
                let gmp = f64::from(day) * 10.0;
                row(&format!("{day:02}-01-2024"), gmp, 255.0 + gmp)
            })
            .collect()
    }

    fn trend_dates(record: &SummaryRecord) -> Vec<&str> {
        record.gmp_trend.iter().map(|p| p.date.as_str()).collect()
    }

    #[test]
    fn keeps_most_recent_window_newest_first() {
        let record = reduce(history(), 5, LatestRow::MostRecent).unwrap();
        assert_eq!(
            trend_dates(&record),
            vec!["06-01-2024", "05-01-2024", "04-01-2024", "03-01-2024", "02-01-2024"]
        );
        assert_eq!(record.gmp_trend[0].gmp, Some(60.0));
        assert_eq!(record.base_ipo_price, Some(255.0));
        assert_eq!(record.estimated_listing_price, Some(315.0));
    }

    #[test]
    fn input_order_is_irrelevant() {
        let mut shuffled = history();
        shuffled.reverse();
        shuffled.swap(1, 4);
        assert_eq!(
            reduce(shuffled, 5, LatestRow::MostRecent),
            reduce(history(), 5, LatestRow::MostRecent)
        );
    }

    #[test]
    fn same_day_pair_at_window_edge_keeps_later_row() {
        let mut rows = vec![row("01-01-2024", 1.0, 256.0)];
        rows.extend((2..=6).map(|n| {
            let day = (n - 1).max(1);
            let gmp = f64::from(n);
            row(&format!("{day:02}-01-2024"), gmp, 255.0 + gmp)
        }));

        let record = reduce(rows, 5, LatestRow::MostRecent).unwrap();

        let gmps: Vec<Option<f64>> = record.gmp_trend.iter().map(|p| p.gmp).collect();
        assert_eq!(
            gmps,
            vec![Some(6.0), Some(5.0), Some(4.0), Some(3.0), Some(2.0)]
        );
        assert_eq!(record.gmp_trend[4].date, "01-01-2024");
    }

    #[test]
    fn second_most_recent_row_seeds_prices() {
        let record = reduce(history(), 5, LatestRow::SecondMostRecent).unwrap();
        assert_eq!(record.estimated_listing_price, Some(305.0));
        assert_eq!(record.gmp_trend[0].date, "06-01-2024");
    }

    #[test]
    fn second_most_recent_falls_back_to_only_row() {
        let rows = vec![row("10-02-2024", 12.0, 267.0)];
        let record = reduce(rows, 5, LatestRow::SecondMostRecent).unwrap();
        assert_eq!(record.estimated_listing_price, Some(267.0));
        assert_eq!(record.gmp_trend.len(), 1);
    }

    #[test]
    fn zero_window_keeps_one_row() {
        let record = reduce(history(), 0, LatestRow::MostRecent).unwrap();
        assert_eq!(trend_dates(&record), vec!["06-01-2024"]);
    }

    #[test]
    fn missing_columns_become_null() {
        let rows = vec![
            NormalizedRow::new("01-03-2024")
                .unwrap()
                .with_value(Column::Gmp, None),
        ];
        let record = reduce(rows, 5, LatestRow::MostRecent).unwrap();
        assert_eq!(record.base_ipo_price, None);
        assert_eq!(record.estimated_listing_gains, None);
        assert_eq!(record.gmp_trend[0].gmp, None);
    }

    #[test]
    fn reduction_is_idempotent() {
        let first = reduce(history(), 5, LatestRow::MostRecent).unwrap();
        let kept: Vec<NormalizedRow> = history()
            .into_iter()
            .filter(|r| first.gmp_trend.iter().any(|p| p.date == r.date()))
            .collect();
        assert_eq!(reduce(kept, 5, LatestRow::MostRecent), Some(first));
    }

    #[test]
    fn empty_history_has_no_summary() {
        assert_eq!(reduce(Vec::new(), 5, LatestRow::MostRecent), None);
    }
}
