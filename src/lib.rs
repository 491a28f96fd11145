//! # repowalker
//!
//! List the GitHub repositories you can reach and open documentation pull
//! requests against them.
//!
//! This crate provides:
//! - A blocking GitHub REST client with page-by-page listing of accessible,
//!   owned and organization repositories
//! - Console summaries and a language distribution report
//! - Local checkouts managed through a pluggable [`git::VersionControl`]
//!   backend (libgit2 or the `git` executable)
//! - A sequential pipeline that generates a file in every checkout, pushes a
//!   feature branch and opens a pull request
//!
//! ## Listing repositories
//!
//! ```rust,no_run
//! use repowalker::prelude::*;
//!
//! let config = Config::load(std::path::Path::new(".env"))?;
//! let client = GitHubClient::new(&config);
//!
//! let repos = client.list_repos(&RepoSelection::Owned, Some(50))?;
//! print!("{}", render_summary(&repos, SUMMARY_LIMIT, chrono::Utc::now()));
//! # Ok::<(), repowalker::error::RepoWalkerError>(())
//! ```
//!
//! ## Opening documentation pull requests
//!
//! ```rust,no_run
//! use repowalker::prelude::*;
//!
//! let config = Config::new("ghp_your_token_here");
//! let client = GitHubClient::new(&config);
//! let repos = client.list_org_repos("my-org", Some(3))?;
//!
//! let manager = RepositoryManager::new(&config, Git2Backend::with_token(config.token.as_str()))?;
//! let processor = RepoProcessor::new(manager, &client, ContentService::Mock.generator());
//! let report = processor.process_repositories(&repos, &ProcessOptions::default());
//!
//! for success in &report.successes {
//!     println!("{} -> {}", success.repo.full_name, success.pull_request.html_url);
//! }
//! # Ok::<(), repowalker::error::RepoWalkerError>(())
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod generate;
pub mod git;
pub mod github;
pub mod processor;
pub mod prompt;
pub mod workspace;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Config, DEFAULT_API_URL, DEFAULT_ENV_FILE, TOKEN_ENV_VAR};
    pub use crate::display::{
        LanguageStat, SUMMARY_LIMIT, language_stats, render_language_report, render_summary,
        sort_by_popularity,
    };
    pub use crate::error::{RepoWalkerError, Result};
    pub use crate::generate::{ContentGenerator, ContentService, MockGenerator};
    pub use crate::git::{Git2Backend, GitBinary, VcsBackend, VersionControl};
    pub use crate::github::{
        CreatePullRequest, GitHubClient, OrganizationRecord, PullRequestOps, PullRequestRecord,
        RepoOps, RepoSelection, RepositoryRecord, UserRecord,
    };
    pub use crate::processor::{
        ProcessOptions, ProcessingFailure, ProcessingReport, ProcessingResult, ProcessingSuccess,
        RepoProcessor,
    };
    pub use crate::workspace::{CheckoutState, CommitOutcome, LocalCheckout, RepositoryManager};
}

pub use prelude::*;
