//! Lookup configuration.
//!
//! [`GmpConfig`] carries every tunable of the pipeline. Defaults match the
//! live GMP site; [`GmpConfig::from_env`] overrides them from environment
//! variables so deployments can switch discovery strategy or latest-row
//! policy without a rebuild.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use ipo_gmp_models::{LatestRow, ResolverKind};

use crate::GmpError;

/// Directory that holds the GMP blog pages.
pub const DEFAULT_BASE_URL: &str = "https://univest.in/blogs";

/// Literal that must appear in a candidate page body for it to be accepted.
pub const DEFAULT_MARKER: &str = "GMP";

/// Desktop browser identity sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// Search API endpoint used by the external-search resolver.
pub const DEFAULT_SEARCH_URL: &str = "https://serpapi.com/search.json";

/// Number of most recent observations kept in the trend.
pub const DEFAULT_WINDOW: usize = 5;

/// Default number of lookups in flight during a batch.
pub const DEFAULT_CONCURRENCY: usize = 8;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for the external search collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Search API endpoint.
    pub endpoint: String,
    /// API key; external search cannot run without one.
    pub api_key: Option<String>,
    /// Search engine requested from the API.
    pub engine: String,
    /// Geographic location hint.
    pub location: String,
    /// Interface language (`hl`).
    pub language: String,
    /// Country code (`gl`).
    pub country: String,
    /// Keywords appended to the offering name to form the query.
    pub query_suffix: String,
    /// A result link is accepted if it contains any of these.
    pub link_patterns: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_URL.to_owned(),
            api_key: None,
            engine: "google".to_owned(),
            location: "India".to_owned(),
            language: "hi".to_owned(),
            country: "in".to_owned(),
            query_suffix: "ipo gmp univest".to_owned(),
            link_patterns: vec!["univest.in/blogs".to_owned(), "univest.in/ipo".to_owned()],
        }
    }
}

/// Configuration for a [`crate::GmpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmpConfig {
    /// Base URL the slug templates are appended to.
    pub base_url: String,
    /// Case-sensitive literal a probed page must contain.
    pub marker: String,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Page discovery strategy.
    pub resolver: ResolverKind,
    /// Which row of the trend window seeds the summary's price fields.
    pub latest_row: LatestRow,
    /// Number of most recent observations kept in the trend (at least 1).
    pub window: usize,
    /// Timeout for the final document fetch and for search calls.
    pub timeout: Duration,
    /// Timeout for each candidate probe.
    pub probe_timeout: Duration,
    /// Maximum lookups in flight during a batch (at least 1).
    pub concurrency: usize,
    /// External search settings.
    pub search: SearchConfig,
}

impl Default for GmpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            marker: DEFAULT_MARKER.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            resolver: ResolverKind::default(),
            latest_row: LatestRow::default(),
            window: DEFAULT_WINDOW,
            timeout: DEFAULT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            search: SearchConfig::default(),
        }
    }
}

impl GmpConfig {
    /// Builds a configuration from the process environment.
    ///
    /// Unset variables keep their defaults. Recognised variables:
    /// `GMP_BASE_URL`, `GMP_MARKER`, `GMP_USER_AGENT`, `GMP_RESOLVER`,
    /// `GMP_LATEST_ROW`, `GMP_WINDOW`, `GMP_TIMEOUT_SECS`,
    /// `GMP_PROBE_TIMEOUT_SECS`, `GMP_CONCURRENCY`, `SERP_URL` and
    /// `SERP_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError::Config`] if a variable is set to a value that
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, GmpError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, using the same
    /// keys as [`GmpConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`GmpError::Config`] if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GmpError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("GMP_BASE_URL") {
            config = config.with_base_url(&v);
        }
        if let Some(v) = get("GMP_MARKER") {
            config.marker = v;
        }
        if let Some(v) = get("GMP_USER_AGENT") {
            config.user_agent = v;
        }
        if let Some(v) = get("GMP_RESOLVER") {
            config.resolver = parse_var("GMP_RESOLVER", &v)?;
        }
        if let Some(v) = get("GMP_LATEST_ROW") {
            config.latest_row = parse_var("GMP_LATEST_ROW", &v)?;
        }
        if let Some(v) = get("GMP_WINDOW") {
            config = config.with_window(parse_var("GMP_WINDOW", &v)?);
        }
        if let Some(v) = get("GMP_TIMEOUT_SECS") {
            let secs = parse_var("GMP_TIMEOUT_SECS", &v)?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(v) = get("GMP_PROBE_TIMEOUT_SECS") {
            let secs = parse_var("GMP_PROBE_TIMEOUT_SECS", &v)?;
            config = config.with_probe_timeout(Duration::from_secs(secs));
        }
        if let Some(v) = get("GMP_CONCURRENCY") {
            config = config.with_concurrency(parse_var("GMP_CONCURRENCY", &v)?);
        }
        if let Some(v) = get("SERP_URL") {
            config.search.endpoint = v;
        }
        config.search.api_key = get("SERP_API_KEY");

        Ok(config)
    }

    /// Sets the discovery strategy.
    #[must_use]
    pub const fn with_resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the latest-row policy.
    #[must_use]
    pub const fn with_latest_row(mut self, latest_row: LatestRow) -> Self {
        self.latest_row = latest_row;
        self
    }

    /// Sets the trend window size. Zero is treated as one.
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Sets the document fetch timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the per-candidate probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the batch concurrency. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the template base URL. A trailing `/` is dropped.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url.trim_end_matches('/').clone_into(&mut self.base_url);
        self
    }

    /// Sets the search API key.
    #[must_use]
    pub fn with_search_api_key(mut self, api_key: &str) -> Self {
        self.search.api_key = Some(api_key.to_owned());
        self
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, GmpError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GmpError::Config(format!("invalid {key} value '{value}': {e}")))
}
