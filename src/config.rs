//! Runtime configuration and token storage.
//!
//! The token is looked up in the `REPOWALKER_AUTH_TOKEN` environment variable
//! first and then in a `.env`-style file of `KEY=value` lines.

use crate::error::{RepoWalkerError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable (and env-file key) holding the GitHub token.
pub const TOKEN_ENV_VAR: &str = "REPOWALKER_AUTH_TOKEN";

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default env file, relative to the current directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Configuration shared by the API client and the repository manager.
#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub api_base_url: String,
    /// Fixed directory for checkouts. `None` means a temporary directory
    /// that is removed when the manager is dropped.
    pub working_dir: Option<PathBuf>,
}

impl Config {
    /// Create a configuration for the public GitHub API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: DEFAULT_API_URL.into(),
            working_dir: None,
        }
    }

    /// Load the token from the environment or the given env file.
    pub fn load(env_file: &Path) -> Result<Self> {
        let token = resolve_token(std::env::var(TOKEN_ENV_VAR).ok(), env_file)?;
        Ok(Self::new(token))
    }

    /// Use a different API base URL (GitHub Enterprise, tests).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.api_base_url = url;
        self
    }

    /// Keep checkouts under a fixed directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

/// Pick the token from an explicit environment value or the env file.
///
/// Empty values count as absent.
pub fn resolve_token(env_value: Option<String>, env_file: &Path) -> Result<String> {
    if let Some(token) = env_value.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    if let Some(token) = read_token_file(env_file)? {
        return Ok(token);
    }

    Err(RepoWalkerError::MissingCredential { var: TOKEN_ENV_VAR })
}

/// Read the token entry from an env file, if the file and the entry exist.
pub fn read_token_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .filter(|(key, value)| *key == TOKEN_ENV_VAR && !value.is_empty())
        .map(|(_, value)| value)
        .last())
}

/// Parse a single `KEY=value` line.
///
/// Accepts an optional `export ` prefix and single or double quotes around
/// the value. Blank lines and `#` comments yield `None`.
pub fn parse_env_line(line: &str) -> Option<(&str, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value);

    Some((key, value.to_string()))
}

/// Write the token into the env file.
///
/// The first existing token line is replaced in place and any duplicates are
/// dropped; every other line is preserved. Without an existing entry the
/// token line is appended.
pub fn store_token(path: &Path, token: &str) -> Result<()> {
    let existing = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let entry = format!("{}={}", TOKEN_ENV_VAR, token);
    let mut lines = Vec::new();
    let mut replaced = false;

    for line in existing.lines() {
        let is_token_line = parse_env_line(line).is_some_and(|(key, _)| key == TOKEN_ENV_VAR);
        if !is_token_line {
            lines.push(line.to_string());
        } else if !replaced {
            lines.push(entry.clone());
            replaced = true;
        }
    }

    if !replaced {
        lines.push(entry);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;

    tracing::debug!("stored token in {}", path.display());
    Ok(())
}
