//! GitHub repository, organization and user records and listing operations.

use crate::error::Result;
use crate::github::paginate::{page_params, Paginator, MAX_PER_PAGE};
use crate::github::GitHubClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Repository information from the GitHub API.
///
/// Fields GitHub may omit or send as `null` fall back to defaults: an empty
/// description, zero counts, and `main` as the default branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub full_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default = "main_branch", deserialize_with = "branch_or_main")]
    pub default_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stargazers_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub watchers_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub forks_count: u64,
    /// Size in kilobytes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepositoryRecord {
    /// Minimal record with only a full name; everything else defaulted.
    pub fn new(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit_once('/')
            .map(|(_, n)| n.to_string())
            .unwrap_or_else(|| full_name.clone());
        Self {
            clone_url: format!("https://github.com/{}.git", full_name),
            html_url: format!("https://github.com/{}", full_name),
            full_name,
            name,
            default_branch: main_branch(),
            description: String::new(),
            language: None,
            stargazers_count: 0,
            watchers_count: 0,
            forks_count: 0,
            size: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Stars plus watchers, the ordering key for summaries.
    pub fn popularity(&self) -> u64 {
        self.stargazers_count + self.watchers_count
    }

    /// Directory name used for the local checkout (`owner/name` → `owner_name`).
    pub fn checkout_dir_name(&self) -> String {
        self.full_name.replace('/', "_")
    }
}

fn main_branch() -> String {
    "main".into()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn branch_or_main<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|b| !b.is_empty())
        .unwrap_or_else(main_branch))
}

/// An organization the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub login: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Which set of repositories to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSelection {
    /// Everything the user can access, including collaborations.
    Accessible,
    /// Repositories owned by the authenticated user.
    Owned,
    /// Repositories of one organization.
    Organization(String),
}

/// Repository listing operations.
pub trait RepoOps {
    /// Get the authenticated user.
    fn get_authenticated_user(&self) -> Result<UserRecord>;

    /// List the organizations of the authenticated user.
    fn list_organizations(&self) -> Result<Vec<OrganizationRecord>>;

    /// List every repository the user can access, most recently updated first.
    fn list_accessible_repos(&self, limit: Option<usize>) -> Result<Vec<RepositoryRecord>>;

    /// List repositories owned by the authenticated user.
    fn list_owned_repos(&self, limit: Option<usize>) -> Result<Vec<RepositoryRecord>>;

    /// List repositories of an organization.
    fn list_org_repos(&self, org: &str, limit: Option<usize>) -> Result<Vec<RepositoryRecord>>;

    /// Get a repository by its `owner/name`.
    fn get_repository(&self, full_name: &str) -> Result<RepositoryRecord>;

    /// List repositories for a selection.
    fn list_repos(
        &self,
        selection: &RepoSelection,
        limit: Option<usize>,
    ) -> Result<Vec<RepositoryRecord>> {
        match selection {
            RepoSelection::Accessible => self.list_accessible_repos(limit),
            RepoSelection::Owned => self.list_owned_repos(limit),
            RepoSelection::Organization(org) => self.list_org_repos(org, limit),
        }
    }
}

impl GitHubClient {
    /// Fetch every page of a repository list endpoint, most recently updated first.
    fn list_repo_pages(
        &self,
        endpoint: &str,
        extra: &[(&'static str, &str)],
        limit: Option<usize>,
    ) -> Result<Vec<RepositoryRecord>> {
        Paginator::new(MAX_PER_PAGE)
            .limit(limit)
            .on_full_page(|n| self.report_progress(n))
            .fetch(|page| {
                let mut query = page_params(MAX_PER_PAGE, page);
                query.push(("sort", "updated".into()));
                query.push(("direction", "desc".into()));
                query.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
                self.get(endpoint, &query)
            })
    }
}

impl RepoOps for GitHubClient {
    fn get_authenticated_user(&self) -> Result<UserRecord> {
        self.get("/user", &[])
    }

    fn list_organizations(&self) -> Result<Vec<OrganizationRecord>> {
        Paginator::new(MAX_PER_PAGE).fetch(|page| self.get("/user/orgs", &page_params(MAX_PER_PAGE, page)))
    }

    fn list_accessible_repos(&self, limit: Option<usize>) -> Result<Vec<RepositoryRecord>> {
        self.list_repo_pages("/user/repos", &[], limit)
    }

    fn list_owned_repos(&self, limit: Option<usize>) -> Result<Vec<RepositoryRecord>> {
        let user = self.get_authenticated_user()?;
        let endpoint = format!("/users/{}/repos", urlencoding::encode(&user.login));
        self.list_repo_pages(&endpoint, &[("type", "owner")], limit)
    }

    fn list_org_repos(&self, org: &str, limit: Option<usize>) -> Result<Vec<RepositoryRecord>> {
        let endpoint = format!("/orgs/{}/repos", urlencoding::encode(org));
        self.list_repo_pages(&endpoint, &[], limit)
    }

    fn get_repository(&self, full_name: &str) -> Result<RepositoryRecord> {
        let endpoint = format!("/repos/{}", full_name);
        self.get(&endpoint, &[])
    }
}
