//! Version control by running the `git` executable.

use crate::error::{RepoWalkerError, Result};
use crate::git::{redact, GitCredentials, VersionControl};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, debug_span};

/// Environment variable the credential helper reads the token from.
const TOKEN_ENV_VAR: &str = "REPOWALKER_GIT_TOKEN";

/// Inline credential helper answering `get` with the token from the
/// environment. The empty `credential.helper=` before it drops any helpers
/// from the user's configuration for that invocation.
const CREDENTIAL_HELPER: &str = r#"credential.helper=!_repowalker_creds() { test "$1" = get || return 0; echo username=x-access-token; echo "password=$REPOWALKER_GIT_TOKEN"; }; _repowalker_creds"#;

/// Identity used for commits when `user.name` or `user.email` is unset.
const BOT_NAME: &str = "repowalker";
const BOT_EMAIL: &str = "repowalker@users.noreply.github.com";

/// [`VersionControl`] implementation that shells out to `git`.
#[derive(Debug, Clone)]
pub struct GitBinary {
    program: PathBuf,
    credentials: Option<GitCredentials>,
    envs: Vec<(OsString, OsString)>,
}

impl GitBinary {
    /// Use the `git` found on `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            credentials: None,
            // Never block on a credential prompt.
            envs: vec![("GIT_TERMINAL_PROMPT".into(), "0".into())],
        }
    }

    /// Answer HTTPS credential requests with `token`.
    ///
    /// The token reaches `git` through an environment variable read by an
    /// inline credential helper; it never appears in arguments or URLs.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(GitCredentials::new(token));
        self
    }

    /// Set an environment variable for every `git` invocation.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn git(&self, repo: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(repo) = repo {
            cmd.current_dir(repo);
        }
        cmd.envs(self.envs.iter().map(|(k, v)| (k, v)));
        cmd.stdin(Stdio::null());
        cmd
    }

    /// A command for subcommands that talk to a remote.
    fn remote_git(&self, repo: Option<&Path>) -> Command {
        let mut cmd = self.git(repo);
        if let Some(credentials) = &self.credentials {
            cmd.args(["-c", "credential.helper=", "-c", CREDENTIAL_HELPER]);
            cmd.env(TOKEN_ENV_VAR, credentials.password());
        }
        cmd
    }

    /// Run `git <args>` for a local operation.
    fn run<I, S>(&self, repo: Option<&Path>, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.exec(self.git(repo), args)
    }

    /// Run `git <args>` with the credential helper installed.
    fn run_remote<I, S>(&self, repo: Option<&Path>, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.exec(self.remote_git(repo), args)
    }

    /// Append `args` to `cmd` and run it, failing on a non-zero exit status.
    ///
    /// Only the subcommand name is kept in errors and logs.
    fn exec<I, S>(&self, mut cmd: Command, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let subcommand = args
            .first()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .unwrap_or_default();

        let _span = debug_span!("git", subcommand = %subcommand).entered();
        let output = cmd.args(&args).output()?;
        debug!("git {} exited with {}", subcommand, output.status);

        if !output.status.success() {
            return Err(RepoWalkerError::GitCommand {
                command: subcommand,
                status: output.status,
                stderr: redact(String::from_utf8_lossy(&output.stderr).trim()),
            });
        }
        Ok(output)
    }

    /// Value of a config key, `None` when it is unset.
    fn config_value(&self, repo: &Path, key: &str) -> Result<Option<String>> {
        let output = self
            .git(Some(repo))
            .args(["config", "--get", key])
            .output()?;
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(RepoWalkerError::GitCommand {
                command: "config".into(),
                status: output.status,
                stderr: redact(String::from_utf8_lossy(&output.stderr).trim()),
            }),
        }
    }

    /// A command that commits as the configured user, falling back to the
    /// repowalker identity for whichever of name and email is missing.
    fn committer(&self, repo: &Path) -> Result<Command> {
        let mut cmd = self.git(Some(repo));
        if self.config_value(repo, "user.name")?.is_none_or(|v| v.is_empty()) {
            cmd.arg("-c").arg(format!("user.name={}", BOT_NAME));
        }
        if self.config_value(repo, "user.email")?.is_none_or(|v| v.is_empty()) {
            cmd.arg("-c").arg(format!("user.email={}", BOT_EMAIL));
        }
        Ok(cmd)
    }
}

impl Default for GitBinary {
    /// Equivalent to `GitBinary::new()`
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for GitBinary {
    fn clone_shallow(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        self.run_remote(
            None,
            [
                OsStr::new("clone"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new("--branch"),
                OsStr::new(branch),
                OsStr::new(url),
                dest.as_os_str(),
            ],
        )?;
        Ok(())
    }

    fn fetch(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run_remote(Some(repo), ["fetch", remote, branch])?;
        Ok(())
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(Some(repo), ["checkout", branch])?;
        Ok(())
    }

    fn reset_hard(&self, repo: &Path, target: &str) -> Result<()> {
        self.run(Some(repo), ["reset", "--hard", target])?;
        Ok(())
    }

    fn create_branch(&self, repo: &Path, name: &str) -> Result<()> {
        self.run(Some(repo), ["checkout", "-b", name])?;
        Ok(())
    }

    fn add_all(&self, repo: &Path) -> Result<()> {
        self.run(Some(repo), ["add", "--all", "."])?;
        Ok(())
    }

    fn has_staged_changes(&self, repo: &Path) -> Result<bool> {
        // `--quiet` exits 1 when there are differences.
        let output = self
            .git(Some(repo))
            .args(["diff", "--cached", "--quiet"])
            .output()?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(RepoWalkerError::GitCommand {
                command: "diff".into(),
                status: output.status,
                stderr: redact(String::from_utf8_lossy(&output.stderr).trim()),
            }),
        }
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        let cmd = self.committer(repo)?;
        self.exec(cmd, ["commit", "-m", message])?;
        Ok(())
    }

    fn remote_url(&self, repo: &Path, remote: &str) -> Result<String> {
        let output = self.run(Some(repo), ["remote", "get-url", remote])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<()> {
        self.run(Some(repo), ["remote", "set-url", remote, url])?;
        Ok(())
    }

    fn push_upstream(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run_remote(Some(repo), ["push", "-u", remote, branch])
            .map_err(|e| RepoWalkerError::Push {
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()> {
        self.run(Some(repo), ["branch", "-D", name])?;
        Ok(())
    }
}
