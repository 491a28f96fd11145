//! Error types for repowalker.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// The main error type for repository walking operations.
#[derive(Error, Debug)]
pub enum RepoWalkerError {
    #[error("authentication token not found: set {var} or run `repowalker auth`")]
    MissingCredential { var: &'static str },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("git {command} failed ({status}): {stderr}")]
    GitCommand {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Clone failed for {repo}: {message}")]
    Clone { repo: String, message: String },

    #[error("Branch operation failed: {message}")]
    Branch { message: String },

    #[error("Push failed: {message}")]
    Push { message: String },

    #[error("Content generation failed for {}: {message}", path.display())]
    Generation { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operation cancelled by user")]
    UserAbort,
}

impl RepoWalkerError {
    /// HTTP status code, when the error came back from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A specialized Result type for repowalker operations.
pub type Result<T> = std::result::Result<T, RepoWalkerError>;
