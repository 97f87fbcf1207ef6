use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How externally hosted image URLs are routed.
///
/// `Always` sends every HTTP(S) image through the same-origin proxy.
/// `AllowList` proxies only the configured hosts and loads everything else
/// directly, which leaves unknown origins exposed to CORS and hotlink
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyPolicy {
    Always,
    AllowList,
}

impl std::fmt::Display for ProxyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyPolicy::Always => write!(f, "always"),
            ProxyPolicy::AllowList => write!(f, "allow-list"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub env: Environment,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub proxy_policy: ProxyPolicy,
    pub proxy_hosts: Vec<String>,
    pub prefs_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &redact_userinfo(&self.api_url))
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("proxy_policy", &self.proxy_policy)
            .field("proxy_hosts", &self.proxy_hosts)
            .field("prefs_path", &self.prefs_path)
            .finish()
    }
}

/// Replaces `user:pass@` in a URL with `[redacted]@`.
fn redact_userinfo(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://[redacted]@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}
