//! GitHub REST API integration.
//!
//! This module provides a blocking client for the GitHub API to:
//! - Look up the authenticated user and their organizations
//! - List repositories (accessible, owned, or per organization) page by page
//! - Create pull requests
//!
//! # Example
//!
//! ```rust,no_run
//! use repowalker::config::Config;
//! use repowalker::github::{GitHubClient, RepoOps};
//!
//! let client = GitHubClient::new(&Config::new("ghp_your_token_here"));
//!
//! // The ten most recently updated repositories of an organization
//! let repos = client.list_org_repos("my-org", Some(10))?;
//!
//! for repo in repos {
//!     println!("{}: {}", repo.full_name, repo.clone_url);
//! }
//! # Ok::<(), repowalker::error::RepoWalkerError>(())
//! ```

mod client;
mod paginate;
mod pr;
mod repos;

pub use client::{GitHubClient, ProgressFn};
pub use paginate::{Paginator, MAX_PER_PAGE};
pub use pr::{CreatePullRequest, PullRequestOps, PullRequestRecord, PullRequestRef};
pub use repos::{OrganizationRecord, RepoOps, RepoSelection, RepositoryRecord, UserRecord};
