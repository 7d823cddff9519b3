use std::fmt;
use std::time::Duration;

use sch_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Connection settings shared by every Smart City Hub endpoint wrapper.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

/// Accepts `http(s)://host[:port][/path]`; a trailing slash is trimmed.
pub fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let base_url = raw.trim().trim_end_matches('/').to_string();
    let invalid = || {
        AppError::new("CONFIG_API_URL_INVALID", "Server URL must be an http(s) URL")
            .with_details(format!("base_url={raw}"))
    };

    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .ok_or_else(invalid)?;
    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty()
        || host.starts_with(':')
        || host.ends_with(':')
        || base_url.chars().any(|c| c.is_whitespace() || c == '?' || c == '#')
    {
        return Err(invalid());
    }
    Ok(base_url)
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
            token: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bearer token sent on every request; `None` for anonymous calls.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = self.url(path);
        tracing::debug!(method, url = %url, "api request");
        let req = ureq::request(method, &url)
            .timeout(self.timeout)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    pub(crate) fn get(&self, path: &str) -> ureq::Request {
        self.request("GET", path)
    }

    pub(crate) fn post(&self, path: &str) -> ureq::Request {
        self.request("POST", path)
    }

    pub(crate) fn require_token(&self) -> Result<(), AppError> {
        if self.token.is_none() {
            return Err(AppError::new("AUTH_REQUIRED", "You need to log in first"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pull a human-readable reason out of an error response body.
pub(crate) fn server_reason(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_str::<ServerErrorBody>(body) {
        return parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty());
    }
    if body.starts_with('<') {
        return None;
    }
    Some(body.chars().take(MAX_ERROR_BODY_CHARS).collect())
}

/// Map a non-2xx status to a structured error. 401/403 get dedicated auth codes;
/// 5xx and 429 are worth retrying.
pub(crate) fn status_error(code: &str, message: &str, status: u16, body: &str) -> AppError {
    let mut details = format!("status={status}");
    if let Some(reason) = server_reason(body) {
        details.push_str("; ");
        details.push_str(&reason);
    }
    let retryable = status >= 500 || status == 429;
    match status {
        401 => AppError::new("AUTH_UNAUTHORIZED", "Your session has expired; log in again")
            .with_details(details),
        403 => AppError::new("AUTH_FORBIDDEN", "You are not allowed to do that").with_details(details),
        _ => AppError::new(code, message)
            .with_details(details)
            .with_retryable(retryable),
    }
}

/// Convert a failed `ureq` call. Transport failures (DNS, refused, timeout) are retryable.
pub(crate) fn call_error(code: &str, message: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            status_error(code, message, status, &body)
        }
        ureq::Error::Transport(t) => {
            let text = t.to_string();
            if text.contains("timed out") {
                AppError::new("API_TIMEOUT", "The server took too long to respond")
                    .with_details(text)
                    .with_retryable(true)
            } else {
                AppError::new("API_UNREACHABLE", "Failed to reach the Smart City Hub server")
                    .with_details(text)
                    .with_retryable(true)
            }
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(resp: ureq::Response, what: &str) -> Result<T, AppError> {
    resp.into_json::<T>().map_err(|e| {
        AppError::new("API_DECODE_FAILED", format!("Failed to decode {what} response"))
            .with_details(e.to_string())
    })
}

/// Drain and ignore a body for endpoints that answer with nothing useful.
pub(crate) fn discard(resp: ureq::Response) {
    let _ = resp.into_string();
}
