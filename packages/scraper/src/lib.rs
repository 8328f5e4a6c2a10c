#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grey market premium (GMP) lookup pipeline.
//!
//! Given the display name of an IPO, this crate discovers the offering's GMP
//! page, extracts the premium history from it, and reduces that history to a
//! fixed-shape [`SummaryRecord`].
//!
//! The stages, leaf-first:
//!
//! 1. [`slug`] turns the display name into a URL slug.
//! 2. [`resolver`] finds the page, either by probing slug-derived URL
//!    templates or by asking an external [`search`] provider.
//! 3. [`fetch`] downloads the page through a [`fetch::DocumentSource`].
//! 4. [`html_table`] looks for a table with recognised headers, falling back
//!    to [`fallback`] text-pattern extraction.
//! 5. [`normalize`] coerces the cells and orders the rows by date.
//! 6. [`reduce`] keeps the most recent window and shapes the summary.
//!
//! [`GmpClient`] wires the stages together and runs batches of lookups
//! concurrently.

pub mod client;
pub mod config;
pub mod fallback;
pub mod fetch;
pub mod html_table;
pub mod normalize;
pub mod observer;
pub mod reduce;
pub mod resolver;
pub mod search;
pub mod slug;

pub use client::{BatchEntry, GmpClient, extract};
pub use config::{GmpConfig, SearchConfig};
pub use ipo_gmp_models::{
    Column, Failure, FailureCategory, GmpHistory, LatestRow, NormalizedRow, ResolverKind,
    SummaryRecord, TrendPoint,
};

/// Reason given when a lookup is attempted without an offering name.
pub const NAME_REQUIRED: &str = "IPO name required";

/// Errors that can occur while looking up an offering's GMP history.
#[derive(Debug, thiserror::Error)]
pub enum GmpError {
    /// The request was unusable, e.g. an empty offering name.
    #[error("{0}")]
    InvalidInput(String),

    /// No candidate page could be located for the offering.
    #[error("GMP page not found for '{name}'")]
    PageNotFound {
        /// Offering name as given by the caller.
        name: String,
    },

    /// The page was found but neither the table nor the text fallback
    /// produced any rows.
    #[error("No GMP data found at {url}")]
    NoData {
        /// Page that was searched.
        url: String,
    },

    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("GET {url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A document could not be retrieved for a reason other than HTTP.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The search provider failed or returned an unusable body.
    #[error("Search error: {0}")]
    Search(String),

    /// The configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GmpError {
    /// Classifies this error into one of the caller-facing categories.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::InvalidInput(_) => FailureCategory::BadInput,
            Self::PageNotFound { .. } | Self::NoData { .. } => FailureCategory::NotFound,
            Self::Http(_)
            | Self::Status { .. }
            | Self::Fetch { .. }
            | Self::Search(_)
            | Self::Config(_) => FailureCategory::Internal,
        }
    }

    /// Converts this error into the structured failure shown to callers.
    #[must_use]
    pub fn to_failure(&self) -> Failure {
        let detail = match self {
            Self::InvalidInput(message) => message.clone(),
            Self::PageNotFound { .. } => "GMP page not found".to_owned(),
            Self::NoData { .. } => "No GMP data found".to_owned(),
            other => other.to_string(),
        };
        Failure {
            category: self.category(),
            detail,
        }
    }
}
