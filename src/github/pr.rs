//! Pull request operations.

use crate::error::Result;
use crate::github::GitHubClient;
use serde::{Deserialize, Serialize};

/// A pull request on GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    pub head: PullRequestRef,
    pub base: PullRequestRef,
}

/// A reference (branch) in a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub sha: String,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

impl CreatePullRequest {
    /// Create a new pull request.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        head: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            head: head.into(),
            base: base.into(),
        }
    }
}

/// Pull request operations.
pub trait PullRequestOps {
    /// Open a pull request in the repository `full_name` (`owner/name`).
    fn create_pull_request(
        &self,
        full_name: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRecord>;
}

impl<T: PullRequestOps + ?Sized> PullRequestOps for &T {
    fn create_pull_request(
        &self,
        full_name: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRecord> {
        (**self).create_pull_request(full_name, pr)
    }
}

impl PullRequestOps for GitHubClient {
    fn create_pull_request(
        &self,
        full_name: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRecord> {
        tracing::info!("creating pull request in {} ({} -> {})", full_name, pr.head, pr.base);
        let endpoint = format!("/repos/{}/pulls", full_name);
        let created: PullRequestRecord = self.post(&endpoint, pr)?;
        tracing::info!("created pull request #{}: {}", created.number, created.html_url);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_fields() {
        let pr = CreatePullRequest::new("Title", "Body", "docs/auto-gen-1", "main");
        assert_eq!(
            serde_json::to_value(&pr).unwrap(),
            json!({"title": "Title", "body": "Body", "head": "docs/auto-gen-1", "base": "main"})
        );
    }

    #[test]
    fn test_parse_pull_request() {
        let pr: PullRequestRecord = serde_json::from_value(json!({
            "number": 7,
            "html_url": "https://github.com/a/r1/pull/7",
            "title": "Docs",
            "state": "open",
            "head": {"ref": "docs/auto-gen-1", "sha": "abc"},
            "base": {"ref": "main", "sha": "def"}
        }))
        .unwrap();

        assert_eq!(pr.number, 7);
        assert_eq!(pr.head.ref_name, "docs/auto-gen-1");
        assert_eq!(pr.base.ref_name, "main");
    }
}
