//! Document retrieval.
//!
//! Network access goes through the [`DocumentSource`] trait so the rest of
//! the pipeline can be exercised against canned pages. [`HttpDocumentSource`]
//! is the production implementation.

use std::time::Duration;

use async_trait::async_trait;

use crate::GmpError;

/// A fetched page: final status plus the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// URL that was requested.
    pub url: String,
    /// HTTP status code of the response.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl Document {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can GET a page.
///
/// Implementations return `Ok` for any response that arrived, whatever its
/// status; `Err` is reserved for transport failures and timeouts.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Performs a single GET of `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError`] if the request cannot be completed.
    async fn get(&self, url: &str, timeout: Duration) -> Result<Document, GmpError>;
}

/// [`DocumentSource`] backed by a [`reqwest::Client`] carrying a browser-like
/// `User-Agent`.
#[derive(Debug, Clone)]
pub struct HttpDocumentSource {
    client: reqwest::Client,
}

impl HttpDocumentSource {
    /// Builds a client that sends `user_agent` with every request.
    ///
    /// # Errors
    ///
    /// Returns [`GmpError::Config`] if `user_agent` is not a valid header
    /// value, or [`GmpError::Http`] if the client cannot be built.
    pub fn new(user_agent: &str) -> Result<Self, GmpError> {
        Ok(Self {
            client: build_client(user_agent)?,
        })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Document, GmpError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        log::debug!("GET {url} -> {status} ({} bytes)", body.len());

        Ok(Document {
            url: url.to_owned(),
            status,
            body,
        })
    }
}

/// Builds a [`reqwest::Client`] whose default headers carry `user_agent`.
pub(crate) fn build_client(user_agent: &str) -> Result<reqwest::Client, GmpError> {
    let mut header_map = reqwest::header::HeaderMap::new();
    let value = reqwest::header::HeaderValue::from_str(user_agent)
        .map_err(|e| GmpError::Config(format!("invalid user agent '{user_agent}': {e}")))?;
    header_map.insert(reqwest::header::USER_AGENT, value);
    reqwest::Client::builder()
        .default_headers(header_map)
        .build()
        .map_err(GmpError::Http)
}

/// Fetches the HTML of a resolved page.
///
/// Unlike probing, a failure here is final for the lookup: transport errors
/// propagate as-is and a non-success status becomes [`GmpError::Status`].
///
/// # Errors
///
/// Returns [`GmpError`] if the request fails or the status is not 2xx.
pub async fn fetch_html(
    source: &dyn DocumentSource,
    url: &str,
    timeout: Duration,
) -> Result<String, GmpError> {
    let document = source.get(url, timeout).await?;
    if !document.is_success() {
        return Err(GmpError::Status {
            url: url.to_owned(),
            status: document.status,
        });
    }
    Ok(document.body)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`DocumentSource`] for pipeline tests.

    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;

    /// Canned responses keyed by URL. Unknown URLs fail like an unreachable
    /// host. Every requested URL is recorded in order.
    #[derive(Default)]
    pub struct FakeSource {
        pages: BTreeMap<String, Result<(u16, String), String>>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages
                .insert(url.to_owned(), Ok((status, body.to_owned())));
            self
        }

        pub fn failing(mut self, url: &str, message: &str) -> Self {
            self.pages.insert(url.to_owned(), Err(message.to_owned()));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<Document, GmpError> {
            self.requested.lock().unwrap().push(url.to_owned());
            match self.pages.get(url) {
                Some(Ok((status, body))) => Ok(Document {
                    url: url.to_owned(),
                    status: *status,
                    body: body.clone(),
                }),
                Some(Err(message)) => Err(GmpError::Fetch {
                    url: url.to_owned(),
                    message: message.clone(),
                }),
                None => Err(GmpError::Fetch {
                    url: url.to_owned(),
                    message: "connection refused".to_owned(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeSource;
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn fetch_html_returns_body_on_success() {
        let source = FakeSource::new().page("https://a.test/x", 200, "<html>GMP</html>");
        let html = fetch_html(&source, "https://a.test/x", TIMEOUT).await.unwrap();
        assert_eq!(html, "<html>GMP</html>");
    }

    #[tokio::test]
    async fn fetch_html_rejects_error_status() {
        let source = FakeSource::new().page("https://a.test/x", 503, "busy");
        let err = fetch_html(&source, "https://a.test/x", TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, GmpError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn fetch_html_propagates_transport_errors() {
        let source = FakeSource::new().failing("https://a.test/x", "timed out");
        let err = fetch_html(&source, "https://a.test/x", TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, GmpError::Fetch { .. }));
    }

    #[test]
    fn document_success_range() {
        let mut doc = Document {
            url: String::new(),
            status: 204,
            body: String::new(),
        };
        assert!(doc.is_success());
        doc.status = 301;
        assert!(!doc.is_success());
    }

    #[test]
    fn client_rejects_invalid_user_agent() {
        assert!(matches!(
            build_client("bad\nagent"),
            Err(GmpError::Config(_))
        ));
    }
}
