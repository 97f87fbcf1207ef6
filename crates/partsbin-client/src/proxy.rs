//! Rewrites external image URLs to go through the API's same-origin proxy.
//!
//! Many image hosts refuse cross-origin loads or block non-browser clients.
//! The API exposes `GET image-proxy?url=<target>` which fetches the target
//! server-side and streams the bytes back.

use partsbin_core::{ImageSuggestion, ProxyPolicy};
use reqwest::Url;

use crate::error::ClientError;

/// Pure URL rewriter; holds no state beyond its configuration.
#[derive(Debug, Clone)]
pub struct ProxyResolver {
    endpoint: Url,
    policy: ProxyPolicy,
    hosts: Vec<String>,
}

impl ProxyResolver {
    /// Creates a resolver for an explicit proxy endpoint.
    pub fn new<I, S>(endpoint: Url, policy: ProxyPolicy, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut endpoint = endpoint;
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        Self {
            endpoint,
            policy,
            hosts: hosts
                .into_iter()
                .map(|h| h.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Creates a resolver whose endpoint is `image-proxy` under `api_base`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the endpoint cannot be joined
    /// onto `api_base`.
    pub fn for_api_base<I, S>(
        api_base: &Url,
        policy: ProxyPolicy,
        hosts: I,
    ) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoint = api_base
            .join("image-proxy")
            .map_err(|e| ClientError::InvalidUrl {
                url: api_base.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(endpoint, policy, hosts))
    }

    #[must_use]
    pub fn policy(&self) -> ProxyPolicy {
        self.policy
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the URL to fetch `source` from.
    ///
    /// Unparseable and non-HTTP(S) URLs come back unchanged, as do URLs that
    /// already target the proxy endpoint, so resolving twice never double-wraps.
    #[must_use]
    pub fn resolve(&self, source: &str) -> String {
        let Ok(url) = Url::parse(source) else {
            tracing::debug!(source, "image URL does not parse; leaving unchanged");
            return source.to_string();
        };
        if !matches!(url.scheme(), "http" | "https") || self.is_proxy_target(&url) {
            return source.to_string();
        }
        if !self.needs_proxy(&url) {
            return source.to_string();
        }

        let mut proxied = self.endpoint.clone();
        proxied.query_pairs_mut().append_pair("url", source);
        tracing::debug!(source, proxied = %proxied, "routing image through proxy");
        proxied.to_string()
    }

    /// Resolves the on-screen URL for a suggestion (thumbnail if present).
    #[must_use]
    pub fn display_url(&self, suggestion: &ImageSuggestion) -> String {
        self.resolve(suggestion.display_source())
    }

    /// True when `url` already points at the proxy endpoint.
    #[must_use]
    pub fn is_proxy_url(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| self.is_proxy_target(&u))
    }

    fn is_proxy_target(&self, url: &Url) -> bool {
        self.is_same_origin(url) && url.path() == self.endpoint.path()
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.endpoint.origin()
    }

    fn needs_proxy(&self, url: &Url) -> bool {
        if self.is_same_origin(url) {
            return false;
        }
        match self.policy {
            ProxyPolicy::Always => true,
            ProxyPolicy::AllowList => url
                .host_str()
                .is_some_and(|host| self.hosts.iter().any(|h| h == host)),
        }
    }
}
