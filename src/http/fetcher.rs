//! HTTP page fetcher backed by `reqwest`.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::link::parse_link_headers;
use crate::config::{ApiKey, ClientConfig};
use crate::error::{ClientError, FetchError, Result};
use crate::pagination::{Page, PageFetcher, PageRequest};

/// Fetches pages of `T` from a REST API.
///
/// Each request is a `GET` of the descriptor's path and parameters against
/// the base URL. The body must be a JSON array of `T`; related pages come
/// from the response's `Link` headers.
pub struct HttpPageFetcher<T> {
    client: Client,
    base_url: Url,
    api_key: Option<ApiKey>,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageFetcher<T> {
    /// Builds a fetcher from client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;
        Ok(Self::with_client(
            client,
            config.rest_host.clone(),
            config.api_key.clone(),
        ))
    }

    /// Builds a fetcher around an existing `reqwest` client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, api_key: Option<ApiKey>) -> Self {
        Self {
            client,
            base_url,
            api_key,
            _item: PhantomData,
        }
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `request` to an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if the path cannot be joined
    /// onto the base URL.
    pub fn url_for(&self, request: &PageRequest) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(request.path())
            .map_err(|e| FetchError::InvalidRequest(format!("{}: {e}", request.path())))?;
        url.set_query(None);
        if !request.params().is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .params()
                    .iter()
                    .map(|p| (p.key.as_str(), p.value.as_str())),
            );
        }
        Ok(url)
    }
}

impl<T> Clone for HttpPageFetcher<T> {
    fn clone(&self) -> Self {
        Self::with_client(
            self.client.clone(),
            self.base_url.clone(),
            self.api_key.clone(),
        )
    }
}

impl<T> fmt::Debug for HttpPageFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPageFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> PageFetcher for HttpPageFetcher<T>
where
    T: DeserializeOwned + Send + Sync,
{
    type Item = T;
    type Descriptor = PageRequest;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T, PageRequest>, FetchError> {
        let url = self.url_for(request)?;
        tracing::debug!(%url, "GET page");

        let mut builder = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            builder = builder.basic_auth(&key.name, Some(&key.secret));
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = status_message(status, response.text().await.ok());
            tracing::warn!(%url, status = status.as_u16(), "page request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let links = parse_link_headers(
            response
                .headers()
                .get_all(LINK)
                .iter()
                .filter_map(|v| v.to_str().ok()),
            &url,
        )?;
        let body = response.bytes().await?;
        let items: Vec<T> = serde_json::from_slice(&body)?;
        Ok(Page::new(items, links))
    }
}

/// Message for a failed response: its body, or the canonical reason when
/// the body is empty or could not be read.
fn status_message(status: StatusCode, body: Option<String>) -> String {
    match body {
        Some(body) if !body.trim().is_empty() => body,
        _ => status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    use crate::pagination::Param;
    use crate::stats::Stats;

    fn fetcher() -> HttpPageFetcher<Stats> {
        let Ok(base) = Url::parse("http://127.0.0.1:8080/v1/") else {
            panic!("valid url");
        };
        HttpPageFetcher::with_client(Client::new(), base, None)
    }

    #[test]
    fn absolute_path_replaces_base_path() {
        let request = PageRequest::with_params(
            "/stats",
            vec![Param::new("start", "2024-03-07:14:05"), Param::new("limit", "1")],
        );
        let Ok(url) = fetcher().url_for(&request) else {
            panic!("valid request");
        };
        assert_eq!(url.path(), "/stats");
        assert_eq!(url.query(), Some("start=2024-03-07%3A14%3A05&limit=1"));
    }

    #[test]
    fn relative_path_is_joined_under_base() {
        let Ok(url) = fetcher().url_for(&PageRequest::new("stats")) else {
            panic!("valid request");
        };
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/v1/stats");
    }

    #[test]
    fn status_message_never_blank() {
        assert_eq!(
            status_message(StatusCode::UNAUTHORIZED, Some("missing credentials".to_string())),
            "missing credentials"
        );
        assert_eq!(status_message(StatusCode::UNAUTHORIZED, None), "Unauthorized");
        assert_eq!(
            status_message(StatusCode::SERVICE_UNAVAILABLE, Some("  ".to_string())),
            "Service Unavailable"
        );
        let Ok(unknown) = StatusCode::from_u16(599) else {
            panic!("valid status");
        };
        assert_eq!(status_message(unknown, None), "HTTP 599");
    }
}
