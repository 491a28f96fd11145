//! Version-control operations needed to prepare documentation pull requests.
//!
//! Everything the repository manager does to a checkout goes through the
//! [`VersionControl`] trait, which has two implementations:
//! - [`Git2Backend`]: in-process, built on libgit2
//! - [`GitBinary`]: runs the `git` executable
//!
//! Both take the access token as [`GitCredentials`] and answer the remote's
//! authentication challenge with it; remote URLs stay free of credentials.
//!
//! # Example
//!
//! ```rust,no_run
//! use repowalker::git::{Git2Backend, VersionControl};
//! use std::path::Path;
//!
//! let git = Git2Backend::with_token("ghp_example");
//! let repo = Path::new("./my-repo");
//!
//! git.create_branch(repo, "docs/auto-gen-20240101-000000")?;
//! // ... write files ...
//! git.add_all(repo)?;
//! if git.has_staged_changes(repo)? {
//!     git.commit(repo, "docs: add generated README.md")?;
//! }
//! # Ok::<(), repowalker::error::RepoWalkerError>(())
//! ```

mod auth;
mod binary;
mod git2_backend;

pub use auth::{has_credentials, redact, strip_credentials, GitCredentials, TOKEN_USERNAME};
pub use binary::GitBinary;
pub use git2_backend::Git2Backend;

use crate::error::Result;
use std::path::Path;

/// Name of the remote every checkout is cloned from.
pub const ORIGIN: &str = "origin";

/// The git operations used on a local checkout.
///
/// Every method receives the checkout's working directory; implementations
/// keep no per-repository state.
pub trait VersionControl {
    /// Clone only the tip of `branch` from `url` into `dest`.
    fn clone_shallow(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;

    /// Fetch `branch` from `remote`, updating its remote-tracking ref.
    fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Check out an existing branch, creating it from `origin/<branch>` if
    /// only the remote-tracking ref exists.
    fn checkout(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Hard-reset the current branch and working tree to `target`
    /// (a revision such as `origin/main`).
    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()>;

    /// Create a new branch at HEAD and check it out. Fails if it exists.
    fn create_branch(&self, repo: &Path, name: &str) -> Result<()>;

    /// Stage all new, modified and deleted files.
    fn add_all(&self, repo: &Path) -> Result<()>;

    /// Whether the index differs from HEAD.
    fn has_staged_changes(&self, repo: &Path) -> Result<bool>;

    /// Commit the staged changes on the current branch.
    fn commit(&self, repo: &Path, message: &str) -> Result<()>;

    /// Get the URL of a remote.
    fn remote_url(&self, repo: &Path, remote: &str) -> Result<String>;

    /// Replace the URL of a remote.
    fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<()>;

    /// Push `branch` to `remote` and set it as the upstream.
    fn push_upstream(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Force-delete a local branch.
    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()>;
}

impl<T: VersionControl + ?Sized> VersionControl for &T {
    fn clone_shallow(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        (**self).clone_shallow(url, branch, dest)
    }
    fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        (**self).fetch(repo, remote, branch)
    }
    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        (**self).checkout(repo, branch)
    }
    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()> {
        (**self).reset_hard(repo, target)
    }
    fn create_branch(&self, repo: &Path, name: &str) -> Result<()> {
        (**self).create_branch(repo, name)
    }
    fn add_all(&self, repo: &Path) -> Result<()> {
        (**self).add_all(repo)
    }
    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        (**self).has_staged_changes(repo)
    }
    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        (**self).commit(repo, message)
    }
    fn remote_url(&self, repo: &Path, remote: &str) -> Result<String> {
        (**self).remote_url(repo, remote)
    }
    fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<()> {
        (**self).set_remote_url(repo, remote, url)
    }
    fn push_upstream(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        (**self).push_upstream(repo, remote, branch)
    }
    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()> {
        (**self).delete_branch(repo, name)
    }
}

/// Which [`VersionControl`] implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum VcsBackend {
    /// libgit2, in process.
    #[default]
    Git2,
    /// The `git` executable found on `PATH`.
    Binary,
}
