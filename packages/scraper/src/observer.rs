//! Lookup event reporting.
//!
//! Defines a [`LookupObserver`] trait that decouples pipeline diagnostics
//! from any specific sink. The pipeline receives an observer instead of
//! writing debug output itself; [`LogObserver`] forwards events to the `log`
//! facade and [`NullObserver`] discards them.

use std::fmt;
use std::sync::Arc;

use ipo_gmp_models::SummaryRecord;

use crate::GmpError;

/// Why a candidate page was not accepted during probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The server answered with a non-success status.
    Status(u16),
    /// The body did not contain the required marker.
    MissingMarker,
    /// The request itself failed.
    Unreachable(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {status}"),
            Self::MissingMarker => f.write_str("marker not found in body"),
            Self::Unreachable(message) => write!(f, "unreachable: {message}"),
        }
    }
}

/// Receives structured events from the lookup pipeline.
///
/// Every method has a no-op default so implementations only override what
/// they care about. Implementations must be `Send + Sync` so one observer
/// can be shared by concurrent lookups.
pub trait LookupObserver: Send + Sync {
    /// A lookup for `name` has started.
    fn lookup_started(&self, _name: &str) {}

    /// A candidate URL was probed and rejected.
    fn candidate_rejected(&self, _url: &str, _reason: &Rejection) {}

    /// The search provider failed; the lookup continues as "no URL found".
    fn search_failed(&self, _name: &str, _error: &GmpError) {}

    /// The page for `name` was located at `url`.
    fn resolved(&self, _name: &str, _url: &str) {}

    /// Table number `index` (in document order) produced `rows` rows.
    fn table_selected(&self, _index: usize, _rows: usize) {}

    /// No table qualified; the text fallback produced `rows` rows.
    fn fallback_used(&self, _rows: usize) {}

    /// The lookup for `name` completed.
    fn lookup_finished(&self, _name: &str, _outcome: Result<&SummaryRecord, &GmpError>) {}
}

/// Forwards every event to the `log` facade.
pub struct LogObserver;

impl LookupObserver for LogObserver {
    fn lookup_started(&self, name: &str) {
        log::debug!("Looking up GMP for '{name}'");
    }

    fn candidate_rejected(&self, url: &str, reason: &Rejection) {
        log::debug!("Rejected candidate {url}: {reason}");
    }

    fn search_failed(&self, name: &str, error: &GmpError) {
        log::warn!("Search for '{name}' failed: {error}");
    }

    fn resolved(&self, name: &str, url: &str) {
        log::info!("Resolved '{name}' to {url}");
    }

    fn table_selected(&self, index: usize, rows: usize) {
        log::debug!("Table {index} yielded {rows} GMP rows");
    }

    fn fallback_used(&self, rows: usize) {
        log::debug!("No usable table; text fallback yielded {rows} GMP rows");
    }

    fn lookup_finished(&self, name: &str, outcome: Result<&SummaryRecord, &GmpError>) {
        match outcome {
            Ok(record) => log::info!(
                "GMP lookup for '{name}' succeeded with {} trend points",
                record.gmp_trend.len()
            ),
            Err(e) => log::warn!("GMP lookup for '{name}' failed ({}): {e}", e.category()),
        }
    }
}

/// An observer that silently ignores all events.
pub struct NullObserver;

impl LookupObserver for NullObserver {}

/// Returns a shared [`LogObserver`] instance.
#[must_use]
pub fn log_observer() -> Arc<dyn LookupObserver> {
    Arc::new(LogObserver)
}

/// Returns a shared [`NullObserver`] instance.
#[must_use]
pub fn null_observer() -> Arc<dyn LookupObserver> {
    Arc::new(NullObserver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reasons_are_readable() {
        assert_eq!(Rejection::Status(404).to_string(), "status 404");
        assert_eq!(
            Rejection::MissingMarker.to_string(),
            "marker not found in body"
        );
        assert_eq!(
            Rejection::Unreachable("timed out".to_owned()).to_string(),
            "unreachable: timed out"
        );
    }
}
