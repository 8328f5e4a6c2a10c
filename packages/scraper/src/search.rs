//! External search collaborator.
//!
//! The external-search resolver asks a web search API for the offering's
//! GMP page. [`SearchProvider`] is the seam; [`SerpApiClient`] talks to a
//! SerpAPI-compatible endpoint that answers with an `organic_results` list.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::GmpError;
use crate::config::SearchConfig;

/// One organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    /// Result URL.
    #[serde(default)]
    pub link: Option<String>,
    /// Result title, if the API supplied one.
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
}

/// Parses a search API body. A body without `organic_results` is an empty
/// result list.
///
/// # Errors
///
/// Returns [`GmpError::Search`] if the body is not valid JSON.
pub fn parse_results(body: &str) -> Result<Vec<SearchResult>, GmpError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(|response| response.organic_results)
        .map_err(|e| GmpError::Search(format!("invalid search response: {e}")))
}

/// Something that can run a web search.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns the organic results for `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError`] if the search cannot be performed.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GmpError>;
}

/// [`SearchProvider`] for SerpAPI-style JSON endpoints.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine: String,
    location: String,
    language: String,
    country: String,
    timeout: Duration,
}

impl SerpApiClient {
    /// Builds a client from the search settings.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError::Config`] if no API key is configured, or
    /// [`GmpError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &SearchConfig,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GmpError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GmpError::Config("SERP_API_KEY is required for external search".to_owned())
        })?;
        Ok(Self {
            client: crate::fetch::build_client(user_agent)?,
            endpoint: config.endpoint.clone(),
            api_key,
            engine: config.engine.clone(),
            location: config.location.clone(),
            language: config.language.clone(),
            country: config.country.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GmpError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("engine", self.engine.as_str()),
                ("location", self.location.as_str()),
                ("hl", self.language.as_str()),
                ("gl", self.country.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let results = parse_results(&body)?;

        log::debug!("Search '{query}' returned {} organic results", results.len());

        Ok(results)
    }
}
