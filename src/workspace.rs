//! Local checkouts of remote repositories.
//!
//! A [`RepositoryManager`] owns a working directory with one checkout per
//! repository under `repos/`, named after the repository's full name with
//! slashes replaced (`octo/hello` → `repos/octo_hello`). Each checkout moves
//! through [`CheckoutState`] as it is cloned, branched, committed, pushed and
//! cleaned up.
//!
//! Authentication belongs to the [`VersionControl`] backend; the manager
//! only ever hands it plain clone URLs, and strips user info that an older
//! checkout may still carry in `origin`.

use crate::config::Config;
use crate::error::{RepoWalkerError, Result};
use crate::git::{has_credentials, strip_credentials, VersionControl, ORIGIN};
use crate::github::RepositoryRecord;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Lifecycle of a checkout within one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Absent,
    Cloned,
    BranchCreated,
    Committed,
    Pushed,
    CleanedUp,
}

/// A working copy bound to one repository.
#[derive(Debug, Clone)]
pub struct LocalCheckout {
    pub path: PathBuf,
    pub full_name: String,
    pub default_branch: String,
    pub state: CheckoutState,
    /// Feature branch created in this run, if any.
    pub feature_branch: Option<String>,
}

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The staged diff was empty; nothing was committed.
    NoChanges,
}

/// Manages checkouts inside a working directory.
pub struct RepositoryManager<V> {
    vcs: V,
    working_dir: PathBuf,
    repos_dir: PathBuf,
    // Removes the working directory on drop when it was created here.
    _temp: Option<TempDir>,
}

impl<V: VersionControl> RepositoryManager<V> {
    /// Create a manager using `config.working_dir`, or a fresh temporary
    /// directory that is deleted when the manager is dropped.
    pub fn new(config: &Config, vcs: V) -> Result<Self> {
        let (working_dir, temp) = match &config.working_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                (dir.clone(), None)
            }
            None => {
                let temp = tempfile::Builder::new().prefix("repowalker_").tempdir()?;
                (temp.path().to_path_buf(), Some(temp))
            }
        };

        let repos_dir = working_dir.join("repos");
        std::fs::create_dir_all(&repos_dir)?;
        debug!("working directory: {}", working_dir.display());

        Ok(Self {
            vcs,
            working_dir,
            repos_dir,
            _temp: temp,
        })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }

    /// Where the checkout of `repo` lives, whether or not it exists yet.
    pub fn checkout_path(&self, repo: &RepositoryRecord) -> PathBuf {
        self.repos_dir.join(repo.checkout_dir_name())
    }

    /// Clone the repository's default branch, or refresh an existing checkout.
    ///
    /// A fresh checkout is a shallow clone. An existing one fetches the
    /// default branch, checks it out and hard-resets to the remote tip, so
    /// calling this twice leaves the same directory in the same state.
    pub fn setup_repository(&self, repo: &RepositoryRecord) -> Result<LocalCheckout> {
        let path = self.checkout_path(repo);
        let branch = &repo.default_branch;
        let clone_error = |e: RepoWalkerError| RepoWalkerError::Clone {
            repo: repo.full_name.clone(),
            message: e.to_string(),
        };

        if path.exists() {
            info!("{} already cloned, fetching updates", repo.full_name);
            self.scrub_remote(&path).map_err(clone_error)?;
            self.vcs.fetch(&path, ORIGIN, branch).map_err(clone_error)?;
            self.vcs.checkout(&path, branch).map_err(clone_error)?;
            self.vcs
                .reset_hard(&path, &format!("{}/{}", ORIGIN, branch))
                .map_err(clone_error)?;
        } else {
            info!("cloning {}", repo.full_name);
            let cloned = self
                .vcs
                .clone_shallow(&repo.clone_url, branch, &path)
                .and_then(|()| self.scrub_remote(&path));
            if let Err(e) = cloned {
                if path.exists()
                    && let Err(remove) = std::fs::remove_dir_all(&path)
                {
                    warn!("failed to remove partial checkout {}: {}", path.display(), remove);
                }
                return Err(clone_error(e));
            }
        }

        Ok(LocalCheckout {
            path,
            full_name: repo.full_name.clone(),
            default_branch: branch.clone(),
            state: CheckoutState::Cloned,
            feature_branch: None,
        })
    }

    /// Drop user info from the `origin` URL, left by an older run or by a
    /// clone URL that carried it.
    fn scrub_remote(&self, path: &Path) -> Result<()> {
        let url = self.vcs.remote_url(path, ORIGIN)?;
        if has_credentials(&url) {
            debug!("removing credentials from origin URL in {}", path.display());
            self.vcs.set_remote_url(path, ORIGIN, &strip_credentials(&url))?;
        }
        Ok(())
    }

    /// Create and check out the feature branch.
    pub fn create_branch(&self, checkout: &mut LocalCheckout, name: &str) -> Result<()> {
        info!("creating branch {} in {}", name, checkout.full_name);
        self.vcs.create_branch(&checkout.path, name)?;
        checkout.feature_branch = Some(name.to_string());
        checkout.state = CheckoutState::BranchCreated;
        Ok(())
    }

    /// Stage everything and commit it, unless nothing changed.
    pub fn commit(&self, checkout: &mut LocalCheckout, message: &str) -> Result<CommitOutcome> {
        self.vcs.add_all(&checkout.path)?;

        if !self.vcs.has_staged_changes(&checkout.path)? {
            info!("no changes to commit in {}", checkout.full_name);
            return Ok(CommitOutcome::NoChanges);
        }

        self.vcs.commit(&checkout.path, message)?;
        checkout.state = CheckoutState::Committed;
        Ok(CommitOutcome::Committed)
    }

    /// Push the feature branch with upstream tracking.
    pub fn push(&self, checkout: &mut LocalCheckout) -> Result<()> {
        let branch = checkout
            .feature_branch
            .clone()
            .ok_or_else(|| RepoWalkerError::Push {
                message: format!("no feature branch in {}", checkout.full_name),
            })?;

        info!("pushing {} to {}", branch, checkout.full_name);
        self.vcs.push_upstream(&checkout.path, ORIGIN, &branch)?;
        checkout.state = CheckoutState::Pushed;
        Ok(())
    }

    /// Commit then push. `NoChanges` skips the push.
    pub fn commit_and_push(
        &self,
        checkout: &mut LocalCheckout,
        message: &str,
    ) -> Result<CommitOutcome> {
        let outcome = self.commit(checkout, message)?;
        if outcome == CommitOutcome::Committed {
            self.push(checkout)?;
        }
        Ok(outcome)
    }

    /// Return to the default branch and force-delete the feature branch.
    pub fn cleanup_branch(&self, checkout: &mut LocalCheckout) -> Result<()> {
        if !checkout.path.is_dir() {
            return Err(RepoWalkerError::Branch {
                message: format!("checkout {} not found", checkout.path.display()),
            });
        }

        self.vcs.checkout(&checkout.path, &checkout.default_branch)?;
        if let Some(branch) = checkout.feature_branch.take() {
            info!("deleting branch {} in {}", branch, checkout.full_name);
            self.vcs.delete_branch(&checkout.path, &branch)?;
        }
        checkout.state = CheckoutState::CleanedUp;
        Ok(())
    }

    /// Delete one checkout directory.
    pub fn remove_checkout(&self, checkout: &mut LocalCheckout) -> Result<()> {
        if checkout.path.is_dir() {
            info!("removing checkout {}", checkout.path.display());
            std::fs::remove_dir_all(&checkout.path)?;
        }
        checkout.feature_branch = None;
        checkout.state = CheckoutState::Absent;
        Ok(())
    }

    /// Delete every checkout, leaving an empty `repos/` directory.
    pub fn cleanup_all(&self) -> Result<()> {
        if self.repos_dir.is_dir() {
            info!("removing all checkouts");
            std::fs::remove_dir_all(&self.repos_dir)?;
        }
        std::fs::create_dir_all(&self.repos_dir)?;
        Ok(())
    }
}
