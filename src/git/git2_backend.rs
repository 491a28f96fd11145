//! libgit2-backed version control.

use crate::error::{RepoWalkerError, Result};
use crate::git::{GitCredentials, VersionControl};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Cred, CredentialType, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks,
    Repository, Signature,
};
use std::cell::RefCell;
use std::path::Path;
use url::Url;

/// Fallback identity for commits when no git identity is configured.
const BOT_NAME: &str = "repowalker";
const BOT_EMAIL: &str = "repowalker@users.noreply.github.com";

/// [`VersionControl`] implementation on top of libgit2.
#[derive(Debug, Clone, Default)]
pub struct Git2Backend {
    credentials: Option<GitCredentials>,
}

impl Git2Backend {
    /// A backend without a token. SSH remotes still go through the agent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers HTTPS credential requests with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credentials: Some(GitCredentials::new(token)),
        }
    }

    fn open(repo: &Path) -> Result<Repository> {
        Ok(Repository::open(repo)?)
    }

    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        repo.signature()
            .or_else(|_| Signature::now(BOT_NAME, BOT_EMAIL))
            .map_err(Into::into)
    }

    fn fetch_options<'cb>(&self, url: &str) -> FetchOptions<'cb> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(auth_callbacks(self.credentials.clone()));
        if is_network_url(url) {
            // libgit2's local transport does not support shallow fetches.
            options.depth(1);
        }
        options
    }
}

/// Offer the token once, then the SSH agent once.
///
/// libgit2 calls back again after a rejected credential, so each kind is
/// tried a single time and the next request fails the operation.
fn auth_callbacks<'cb>(credentials: Option<GitCredentials>) -> RemoteCallbacks<'cb> {
    let mut token_offered = false;
    let mut agent_tried = false;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT)
            && !token_offered
            && let Some(credentials) = &credentials
        {
            token_offered = true;
            return Cred::userpass_plaintext(credentials.username(), credentials.password());
        }
        if allowed_types.contains(CredentialType::SSH_KEY) && !agent_tried {
            agent_tried = true;
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        Err(git2::Error::from_str("authentication failed: no usable credentials"))
    });
    callbacks
}

fn is_network_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "https" | "http" | "ssh" | "git"))
}

impl VersionControl for Git2Backend {
    fn clone_shallow(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        tracing::debug!("cloning branch {} into {}", branch, dest.display());
        RepoBuilder::new()
            .branch(branch)
            .fetch_options(self.fetch_options(url))
            .clone(url, dest)?;
        Ok(())
    }

    fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let mut remote = repo.find_remote(remote)?;
        let url = remote.url().unwrap_or_default().to_string();
        let refspec = format!(
            "+refs/heads/{branch}:refs/remotes/{}/{branch}",
            remote.name().unwrap_or(crate::git::ORIGIN)
        );
        tracing::debug!("fetching {}", refspec);
        remote.fetch(&[&refspec], Some(&mut self.fetch_options(&url)), None)?;
        Ok(())
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        let repo = Self::open(repo)?;

        if repo.find_branch(branch, BranchType::Local).is_err() {
            let remote_ref = format!("{}/{}", crate::git::ORIGIN, branch);
            let remote_branch = repo
                .find_branch(&remote_ref, BranchType::Remote)
                .map_err(|_| RepoWalkerError::Branch {
                    message: format!("Branch '{}' not found", branch),
                })?;
            let commit = remote_branch.get().peel_to_commit()?;
            let mut local = repo.branch(branch, &commit, false)?;
            local.set_upstream(Some(&remote_ref))?;
        }

        let refname = format!("refs/heads/{}", branch);
        let obj = repo.find_reference(&refname)?.peel(git2::ObjectType::Commit)?;
        repo.checkout_tree(&obj, Some(CheckoutBuilder::new().force()))?;
        repo.set_head(&refname)?;
        Ok(())
    }

    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let commit = repo.revparse_single(target)?.peel_to_commit()?;
        repo.reset(commit.as_object(), git2::ResetType::Hard, None)?;
        Ok(())
    }

    fn create_branch(&self, repo: &Path, name: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let commit = repo.head()?.peel_to_commit()?;
        repo.branch(name, &commit, false)
            .map_err(|e| RepoWalkerError::Branch {
                message: format!("cannot create '{}': {}", name, e.message()),
            })?;

        let refname = format!("refs/heads/{}", name);
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::new().safe()))?;
        Ok(())
    }

    fn add_all(&self, repo: &Path) -> Result<()> {
        let repo = Self::open(repo)?;
        let mut index = repo.index()?;

        // New and modified files, then deletions.
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;

        index.write()?;
        Ok(())
    }

    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        let repo = Self::open(repo)?;
        let head = repo.head()?.peel_to_tree()?;
        let diff = repo.diff_tree_to_index(Some(&head), None, None)?;
        Ok(diff.deltas().count() > 0)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let signature = Self::signature(&repo)?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let parent = repo.head()?.peel_to_commit()?;

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        tracing::debug!("created commit {}", oid);
        Ok(())
    }

    fn remote_url(&self, repo: &Path, remote: &str) -> Result<String> {
        let repo = Self::open(repo)?;
        let remote_handle = repo.find_remote(remote)?;
        remote_handle
            .url()
            .map(String::from)
            .ok_or_else(|| RepoWalkerError::InvalidConfig(format!("Remote '{}' has no URL", remote)))
    }

    fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        repo.remote_set_url(remote, url)?;
        Ok(())
    }

    fn push_upstream(&self, repo: &Path, remote_name: &str, branch: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let mut remote = repo.find_remote(remote_name).map_err(|_| RepoWalkerError::Push {
            message: format!("Remote '{}' not found", remote_name),
        })?;

        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        let rejected = RefCell::new(None::<String>);

        let mut callbacks = auth_callbacks(self.credentials.clone());
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *rejected.borrow_mut() = Some(format!("{} rejected: {}", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[&refspec], Some(&mut push_options))
            .map_err(|e| RepoWalkerError::Push {
                message: crate::git::redact(e.message()),
            })?;
        drop(push_options);

        if let Some(message) = rejected.into_inner() {
            return Err(RepoWalkerError::Push { message });
        }

        // Record the upstream the way `git push -u` does.
        let tracking = format!("refs/remotes/{}/{}", remote_name, branch);
        let head = repo.find_branch(branch, BranchType::Local)?.get().peel_to_commit()?;
        repo.reference(&tracking, head.id(), true, "push: update tracking ref")?;
        let mut local_branch = repo.find_branch(branch, BranchType::Local)?;
        local_branch.set_upstream(Some(&format!("{}/{}", remote_name, branch)))?;

        Ok(())
    }

    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()> {
        let repo = Self::open(repo)?;
        let mut branch = repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| RepoWalkerError::Branch {
                message: format!("Branch '{}' not found", name),
            })?;
        branch.delete()?;
        Ok(())
    }
}
