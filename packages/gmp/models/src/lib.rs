#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grey market premium (GMP) record types.
//!
//! This crate defines the canonical column vocabulary recognised on GMP
//! pages, the normalized row produced by the extractors, and the summary
//! record handed back to callers. Failure categories shared by every
//! caller-facing surface also live here so that embedders do not need to
//! depend on the scraping crate to interpret a failed lookup.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Day-first date format used by GMP pages once `/` has been replaced by `-`.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Parses a `DD-MM-YYYY` date string into a calendar day.
///
/// Returns `None` for anything that is not a valid day-month-year triple.
#[must_use]
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// One of the fixed canonical columns of a GMP history table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Column {
    /// Observation date.
    #[serde(rename = "Date")]
    #[strum(serialize = "Date")]
    Date,
    /// Offer price of the issue.
    #[serde(rename = "IPO Price")]
    #[strum(serialize = "IPO Price")]
    IpoPrice,
    /// Grey market premium on the observation date.
    #[serde(rename = "GMP")]
    #[strum(serialize = "GMP")]
    Gmp,
    /// Offer price plus premium.
    #[serde(rename = "Estimated Listing Price")]
    #[strum(serialize = "Estimated Listing Price")]
    EstimatedListingPrice,
    /// Premium as a percentage of the offer price.
    #[serde(rename = "Estimated Listing Gains")]
    #[strum(serialize = "Estimated Listing Gains")]
    EstimatedListingGains,
}

impl Column {
    /// Every canonical column, in table order.
    pub const ALL: &[Self] = &[
        Self::Date,
        Self::IpoPrice,
        Self::Gmp,
        Self::EstimatedListingPrice,
        Self::EstimatedListingGains,
    ];

    /// Returns `true` for every column except [`Column::Date`].
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Date)
    }
}

/// A single observation with its cells coerced to canonical types.
///
/// `values` only contains the columns that were present in the source; a
/// present column whose cell could not be parsed maps to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    date: String,
    day: NaiveDate,
    values: BTreeMap<Column, Option<f64>>,
}

impl NormalizedRow {
    /// Creates a row for the given `DD-MM-YYYY` date string.
    ///
    /// Returns `None` if the date cannot be parsed, since such a row can
    /// never be ordered.
    #[must_use]
    pub fn new(date: impl Into<String>) -> Option<Self> {
        let date = date.into();
        let day = parse_day(&date)?;
        Some(Self {
            date,
            day,
            values: BTreeMap::new(),
        })
    }

    /// Sets a numeric column, replacing any previous value.
    ///
    /// Setting [`Column::Date`] is ignored; the date is fixed at
    /// construction.
    #[must_use]
    pub fn with_value(mut self, column: Column, value: Option<f64>) -> Self {
        if column.is_numeric() {
            self.values.insert(column, value);
        }
        self
    }

    /// The date exactly as it appeared in the source (after `/` → `-`).
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The parsed calendar day used for ordering.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// The value of a numeric column, or `None` if it is absent or was
    /// unparseable.
    #[must_use]
    pub fn value(&self, column: Column) -> Option<f64> {
        self.values.get(&column).copied().flatten()
    }

    /// Whether the source carried this column at all.
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        column == Column::Date || self.values.contains_key(&column)
    }
}

impl Serialize for NormalizedRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(&Column::Date, &self.date)?;
        for (column, value) in &self.values {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// One point of the GMP trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Observation date (`DD-MM-YYYY`).
    pub date: String,
    /// Premium on that date, if it was parseable.
    pub gmp: Option<f64>,
}

/// The fixed-shape summary returned for a successfully resolved offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// `IPO Price` of the latest reference row.
    pub base_ipo_price: Option<f64>,
    /// `Estimated Listing Price` of the latest reference row.
    pub estimated_listing_price: Option<f64>,
    /// `Estimated Listing Gains` of the latest reference row.
    pub estimated_listing_gains: Option<f64>,
    /// Most recent observations, newest first.
    pub gmp_trend: Vec<TrendPoint>,
}

/// The full normalized history of an offering, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GmpHistory {
    /// Page the history was extracted from.
    pub url: String,
    /// Every normalized observation in ascending date order.
    pub rows: Vec<NormalizedRow>,
}

/// Which row of the descending trend window seeds the summary's top-level
/// price fields.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum LatestRow {
    /// The newest observation (index 0).
    #[default]
    MostRecent,
    /// The observation before the newest (index 1), or the newest if the
    /// window holds a single row.
    SecondMostRecent,
}

impl LatestRow {
    /// Picks the reference row out of a newest-first window.
    #[must_use]
    pub fn pick<T>(self, descending: &[T]) -> Option<&T> {
        match self {
            Self::MostRecent => descending.first(),
            Self::SecondMostRecent => descending.get(1).or_else(|| descending.first()),
        }
    }
}

/// How the GMP page for an offering is discovered.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ResolverKind {
    /// Guess page URLs from the slugified name and probe them in order.
    #[default]
    TemplateProbe,
    /// Ask an external search engine for the page.
    ExternalSearch,
}

/// Caller-facing failure classes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    /// The request itself was unusable (e.g. no offering name).
    BadInput,
    /// No page or no data could be located. Not a system fault.
    NotFound,
    /// An unexpected fetch or parse failure.
    Internal,
}

impl FailureCategory {
    /// The HTTP status conventionally used for this category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadInput => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }
}

/// A structured lookup failure with a short human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure class.
    pub category: FailureCategory,
    /// Reason shown to the caller.
    pub detail: String,
}
