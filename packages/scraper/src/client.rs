//! Lookup orchestration.
//!
//! [`GmpClient`] owns the collaborators of the pipeline and runs the stages
//! for one offering ([`GmpClient::lookup`]) or many ([`GmpClient::lookup_many`]).

use std::sync::Arc;

use futures::stream::{self, StreamExt as _};
use ipo_gmp_models::{GmpHistory, NormalizedRow, ResolverKind, SummaryRecord};
use scraper::Html;

use crate::config::GmpConfig;
use crate::fetch::{DocumentSource, HttpDocumentSource, fetch_html};
use crate::observer::{LookupObserver, log_observer};
use crate::resolver::{ExternalSearch, Resolver, TemplateProbe};
use crate::search::{SearchProvider, SerpApiClient};
use crate::{GmpError, NAME_REQUIRED, fallback, html_table, reduce};

/// Outcome of one lookup within a batch.
#[derive(Debug)]
pub struct BatchEntry {
    /// Offering name as given.
    pub name: String,
    /// Summary, or why there is none.
    pub result: Result<SummaryRecord, GmpError>,
}

impl BatchEntry {
    /// The summary, if the lookup succeeded.
    #[must_use]
    pub fn record(&self) -> Option<&SummaryRecord> {
        self.result.as_ref().ok()
    }
}

/// Looks up GMP summaries.
#[derive(Clone)]
pub struct GmpClient {
    config: GmpConfig,
    source: Arc<dyn DocumentSource>,
    search: Option<Arc<dyn SearchProvider>>,
    observer: Arc<dyn LookupObserver>,
}

impl GmpClient {
    /// Creates a client that talks HTTP and reports to the `log` facade.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError::Config`] if the user agent is invalid or external
    /// search is selected without an API key, or [`GmpError::Http`] if the
    /// HTTP client cannot be built.
    pub fn new(config: GmpConfig) -> Result<Self, GmpError> {
        let source: Arc<dyn DocumentSource> =
            Arc::new(HttpDocumentSource::new(&config.user_agent)?);
        let search: Option<Arc<dyn SearchProvider>> = match config.resolver {
            ResolverKind::TemplateProbe => None,
            ResolverKind::ExternalSearch => Some(Arc::new(SerpApiClient::from_config(
                &config.search,
                &config.user_agent,
                config.timeout,
            )?)),
        };

        Ok(Self {
            config,
            source,
            search,
            observer: log_observer(),
        })
    }

    /// Replaces the document source.
    #[must_use]
    pub fn with_document_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = source;
        self
    }

    /// Replaces the search provider used by external search.
    #[must_use]
    pub fn with_search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    /// Replaces the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LookupObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GmpConfig {
        &self.config
    }

    fn resolver(&self) -> Result<Resolver, GmpError> {
        match self.config.resolver {
            ResolverKind::TemplateProbe => {
                Ok(Resolver::TemplateProbe(TemplateProbe::from_config(&self.config)))
            }
            ResolverKind::ExternalSearch => {
                let provider = self.search.clone().ok_or_else(|| {
                    GmpError::Config("external search selected without a provider".to_owned())
                })?;
                Ok(Resolver::ExternalSearch(ExternalSearch::new(
                    provider,
                    &self.config.search,
                )))
            }
        }
    }

    /// Returns the summary for one offering.
    ///
    /// # Errors
    ///
    /// * [`GmpError::InvalidInput`] if `name` is blank
    /// * [`GmpError::PageNotFound`] if no page could be located
    /// * [`GmpError::NoData`] if the page holds no GMP rows
    /// * any fetch error of the resolved page
    pub async fn lookup(&self, name: &str) -> Result<SummaryRecord, GmpError> {
        self.observer.lookup_started(name);
        let result = self.summarize(name).await;
        self.observer.lookup_finished(name, result.as_ref());
        result
    }

    async fn summarize(&self, name: &str) -> Result<SummaryRecord, GmpError> {
        let GmpHistory { url, rows } = self.history(name).await?;
        reduce::reduce(rows, self.config.window, self.config.latest_row)
            .ok_or(GmpError::NoData { url })
    }

    /// Returns the full normalized history of one offering, oldest first,
    /// together with the page it came from.
    ///
    /// # Errors
    ///
    /// Same as [`GmpClient::lookup`].
    pub async fn history(&self, name: &str) -> Result<GmpHistory, GmpError> {
        if name.trim().is_empty() {
            return Err(GmpError::InvalidInput(NAME_REQUIRED.to_owned()));
        }

        let resolver = self.resolver()?;
        let url = resolver
            .resolve(name, self.source.as_ref(), self.observer.as_ref())
            .await
            .ok_or_else(|| GmpError::PageNotFound {
                name: name.to_owned(),
            })?;
        self.observer.resolved(name, &url);

        let html = fetch_html(self.source.as_ref(), &url, self.config.timeout).await?;
        let rows = extract(&html, self.observer.as_ref());
        if rows.is_empty() {
            return Err(GmpError::NoData { url });
        }

        Ok(GmpHistory { url, rows })
    }

    /// Looks up every name, at most `concurrency` at a time.
    ///
    /// Entries come back in input order. A failed lookup only affects its
    /// own entry.
    pub async fn lookup_many<S: AsRef<str> + Sync>(&self, names: &[S]) -> Vec<BatchEntry> {
        log::info!(
            "Looking up {} offerings (concurrency={})",
            names.len(),
            self.config.concurrency
        );

        stream::iter(names.iter().map(|name| async move {
            let name = name.as_ref();
            BatchEntry {
                name: name.to_owned(),
                result: self.lookup(name).await,
            }
        }))
        .buffered(self.config.concurrency.max(1))
        .collect()
        .await
    }
}

/// Extracts the GMP rows of a page, oldest first.
///
/// The first table with recognised headers wins. Without one, the text
/// under the GMP heading is pattern-matched instead. An empty result means
/// neither approach found anything.
#[must_use]
pub fn extract(html: &str, observer: &dyn LookupObserver) -> Vec<NormalizedRow> {
    let document = Html::parse_document(html);

    if let Some((index, rows)) = html_table::extract(&document) {
        observer.table_selected(index, rows.len());
        return rows;
    }

    match fallback::extract(&document) {
        Some(rows) => {
            observer.fallback_used(rows.len());
            rows
        }
        None => {
            log::debug!("No GMP table or GMP heading on page");
            Vec::new()
        }
    }
}
