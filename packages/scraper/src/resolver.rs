//! GMP page discovery.
//!
//! Two strategies locate the page for an offering:
//!
//! * [`TemplateProbe`] appends revision suffixes to the slugified name and
//!   GETs each candidate in priority order until one answers 2xx with the
//!   marker literal in its body.
//! * [`ExternalSearch`] asks a [`SearchProvider`] and takes the first result
//!   on the GMP site.
//!
//! Neither strategy fails: every error is reported to the observer and
//! treated as "try the next option", ending in `None`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{GmpConfig, SearchConfig};
use crate::fetch::DocumentSource;
use crate::observer::{LookupObserver, Rejection};
use crate::search::SearchProvider;
use crate::slug::slugify;

/// Revision suffixes, most specific first.
pub const TEMPLATE_SUFFIXES: &[&str] = &["-ipo-gmp-3", "-ipo-gmp-2", "-ipo-gmp"];

/// Builds the ordered candidate URLs for `slug` under `base_url`.
#[must_use]
pub fn candidate_urls(base_url: &str, slug: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    TEMPLATE_SUFFIXES
        .iter()
        .map(|suffix| format!("{base}/{slug}{suffix}"))
        .collect()
}

/// Probes slug-derived URLs in order.
#[derive(Debug, Clone)]
pub struct TemplateProbe {
    base_url: String,
    marker: String,
    timeout: Duration,
}

impl TemplateProbe {
    /// Creates a probe rooted at `base_url` that accepts pages containing
    /// `marker`.
    #[must_use]
    pub fn new(base_url: &str, marker: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.to_owned(),
            marker: marker.to_owned(),
            timeout,
        }
    }

    /// Creates a probe from the lookup configuration.
    #[must_use]
    pub fn from_config(config: &GmpConfig) -> Self {
        Self::new(&config.base_url, &config.marker, config.probe_timeout)
    }

    /// The candidate URLs for an offering name, in probe order.
    ///
    /// Empty if the name has no usable slug.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Vec::new();
        }
        candidate_urls(&self.base_url, &slug)
    }

    /// Returns the first candidate that is reachable and carries the marker.
    pub async fn resolve(
        &self,
        name: &str,
        source: &dyn DocumentSource,
        observer: &dyn LookupObserver,
    ) -> Option<String> {
        for url in self.candidates(name) {
            match self.probe(source, &url).await {
                Ok(()) => return Some(url),
                Err(reason) => observer.candidate_rejected(&url, &reason),
            }
        }
        None
    }

    async fn probe(&self, source: &dyn DocumentSource, url: &str) -> Result<(), Rejection> {
        let document = source
            .get(url, self.timeout)
            .await
            .map_err(|e| Rejection::Unreachable(e.to_string()))?;
        if !document.is_success() {
            return Err(Rejection::Status(document.status));
        }
        if !document.body.contains(&self.marker) {
            return Err(Rejection::MissingMarker);
        }
        Ok(())
    }
}

/// Finds the page through a web search.
#[derive(Clone)]
pub struct ExternalSearch {
    provider: Arc<dyn SearchProvider>,
    query_suffix: String,
    link_patterns: Vec<String>,
}

impl ExternalSearch {
    /// Creates a resolver backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, config: &SearchConfig) -> Self {
        Self {
            provider,
            query_suffix: config.query_suffix.clone(),
            link_patterns: config.link_patterns.clone(),
        }
    }

    /// The search query sent for an offering name.
    #[must_use]
    pub fn query(&self, name: &str) -> String {
        format!("{} {}", name.trim(), self.query_suffix)
    }

    /// Returns the first result link that belongs to the GMP site.
    ///
    /// Search failures are reported to the observer and yield `None`.
    pub async fn resolve(&self, name: &str, observer: &dyn LookupObserver) -> Option<String> {
        let results = match self.provider.search(&self.query(name)).await {
            Ok(results) => results,
            Err(e) => {
                observer.search_failed(name, &e);
                return None;
            }
        };

        let hit = results.into_iter().find(|result| {
            result
                .link
                .as_deref()
                .is_some_and(|link| self.is_gmp_link(link))
        })?;
        log::debug!(
            "Search for '{name}' matched '{}'",
            hit.title.as_deref().unwrap_or("untitled")
        );
        hit.link
    }

    fn is_gmp_link(&self, link: &str) -> bool {
        self.link_patterns
            .iter()
            .any(|pattern| link.contains(pattern.as_str()))
    }
}

/// The configured discovery strategy.
#[derive(Clone)]
pub enum Resolver {
    /// Probe slug-derived URL templates.
    TemplateProbe(TemplateProbe),
    /// Ask an external search provider.
    ExternalSearch(ExternalSearch),
}

impl Resolver {
    /// Locates the GMP page for `name`, or `None` if no option worked.
    pub async fn resolve(
        &self,
        name: &str,
        source: &dyn DocumentSource,
        observer: &dyn LookupObserver,
    ) -> Option<String> {
        match self {
            Self::TemplateProbe(probe) => probe.resolve(name, source, observer).await,
            Self::ExternalSearch(search) => search.resolve(name, observer).await,
        }
    }

    /// Short name of the strategy for log messages.
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::TemplateProbe(_) => "template_probe",
            Self::ExternalSearch(_) => "external_search",
        }
    }
}
