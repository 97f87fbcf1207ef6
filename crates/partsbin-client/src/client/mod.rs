//! HTTP client for the inventory REST API.

mod create;
mod directory;
mod images;
mod search;

use std::time::Duration;

use partsbin_core::{AppConfig, ProxyPolicy};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::proxy::ProxyResolver;
use crate::retry::retry_with_backoff;

pub use images::FetchedImage;

/// Sent when fetching images directly from their origin; many image hosts
/// reject requests that do not look like a browser.
pub(super) const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Client for the inventory REST API.
///
/// Covers the endpoints the Quick-Add flow consumes: part and image search,
/// the location and spec-definition directories, the combined part + stock
/// create, the image proxy, and image upload. Use [`InventoryClient::new`]
/// with an explicit base URL (a wiremock server in tests) or
/// [`InventoryClient::from_config`].
pub struct InventoryClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    pub(super) resolver: ProxyResolver,
    /// Additional attempts after the first failure, GET requests only.
    pub(super) max_retries: u32,
    pub(super) backoff_base_ms: u64,
}

impl InventoryClient {
    /// Creates a client for `base_url` with the given timeout, user agent and
    /// retry policy, proxying images according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` does not parse, or
    /// [`ClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        policy: ProxyPolicy,
        proxy_hosts: &[String],
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Ensure exactly one trailing slash so `join` appends to the API
        // prefix instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let resolver = ProxyResolver::for_api_base(&base_url, policy, proxy_hosts.iter().cloned())?;

        Ok(Self {
            client,
            base_url,
            resolver,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a client from the loaded application configuration.
    ///
    /// # Errors
    ///
    /// See [`InventoryClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
            config.proxy_policy,
            &config.proxy_hosts,
        )
    }

    /// The resolver used for image display and transfer URLs.
    #[must_use]
    pub fn resolver(&self) -> &ProxyResolver {
        &self.resolver
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the API base and appends percent-encoded `query` pairs.
    pub(super) fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// GETs `url` and deserializes the JSON body, retrying transient failures.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url.clone()).send().await?;
            let response = check_status(response).await?;
            let body = response.text().await?;
            serde_json::from_str::<T>(&body).map_err(|e| ClientError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
        })
        .await
    }
}

/// Passes 2xx responses through and turns anything else into
/// [`ClientError::Api`] (or [`ClientError::RateLimited`] for 429) with the
/// server's own message when it sent one.
pub(super) async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = retry_after_hint(&response);
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited {
            message,
            retry_after,
        });
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Reads a delay-seconds `Retry-After` header. HTTP-date values are ignored
/// and fall back to the normal back-off.
pub(super) fn retry_after_hint(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Picks the human-readable message out of an error body: the JSON `error`
/// field, then `message`, then the status line.
pub(super) fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"].iter().find_map(|key| {
                v.get(key)
                    .and_then(serde_json::Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_owned)
            })
        });

    from_json.unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => format!("request failed: {} {reason}", status.as_u16()),
        None => format!("request failed with status {}", status.as_u16()),
    })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
