//! GitHub API client.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{RepoWalkerError, Result};

/// Callback receiving the number of records fetched so far.
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Client for interacting with the GitHub API.
///
/// One blocking session is created per client and reused for every call.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) token: String,
    pub(crate) base_url: String,
    pub(crate) client: Client,
    pub(crate) progress: Option<ProgressFn>,
}

impl GitHubClient {
    /// Create a new client from the runtime configuration.
    pub fn new(config: &Config) -> Self {
        let mut base_url = config.api_base_url.clone();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            token: config.token.clone(),
            base_url,
            client: Client::new(),
            progress: None,
        }
    }

    /// Report pagination progress through the given callback.
    pub fn with_progress(mut self, progress: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
            RepoWalkerError::InvalidConfig("token contains characters not allowed in a header".into())
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("repowalker"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Make a GET request to the GitHub API.
    pub(crate) fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(query)
            .send()?;

        Self::check(response)?.json().map_err(Into::into)
    }

    /// Make a POST request to the GitHub API.
    pub(crate) fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()?;

        Self::check(response)?.json().map_err(Into::into)
    }

    /// Turn any non-2xx response into an `Api` error carrying the body.
    fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(RepoWalkerError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    pub(crate) fn report_progress(&self, fetched: usize) {
        if let Some(progress) = &self.progress {
            progress(fetched);
        }
    }
}

/// Summarize an error body.
///
/// GitHub answers with `{"message": ..., "errors": [...]}`; each entry of
/// `errors` has a `message` or a `code` for a `field`. Those details follow
/// the top-level message. A body that is not such an object is kept whole.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let Some(message) = value.get("message").and_then(|m| m.as_str()) else {
        return body.trim().to_string();
    };

    let details: Vec<String> = value
        .get("errors")
        .and_then(|e| e.as_array())
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let text = |key: &str| entry.get(key).and_then(|v| v.as_str());
            match (text("message"), text("code"), text("field")) {
                (Some(message), _, _) => Some(message.to_string()),
                (None, Some(code), Some(field)) => Some(format!("{} {}", field, code)),
                (None, Some(code), None) => Some(code.to_string()),
                _ => entry.as_str().map(String::from),
            }
        })
        .collect();

    if details.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", message, details.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_plain_json() {
        assert_eq!(error_message(r#"{"message": "Not Found"}"#), "Not Found");
    }

    #[test]
    fn test_error_message_appends_validation_errors() {
        let body = r#"{
            "message": "Validation Failed",
            "errors": [
                {"resource": "PullRequest", "code": "custom", "message": "A pull request already exists for a:docs."},
                {"resource": "PullRequest", "field": "head", "code": "invalid"},
                "base is protected"
            ],
            "documentation_url": "https://docs.github.com/rest"
        }"#;
        assert_eq!(
            error_message(body),
            "Validation Failed: A pull request already exists for a:docs.; head invalid; base is protected"
        );
    }

    #[test]
    fn test_error_message_keeps_unstructured_body() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"error": "nope"}"#), r#"{"error": "nope"}"#);
    }
}
