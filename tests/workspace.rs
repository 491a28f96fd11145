//! Checkout lifecycle tests against local bare remotes.

use git2::build::RepoBuilder;
use git2::{BranchType, Repository, RepositoryInitOptions, Signature};
use repowalker::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A bare repository with one commit on `main`, plus the record pointing at it.
struct Remote {
    _dir: TempDir,
    bare: std::path::PathBuf,
    record: RepositoryRecord,
}

fn create_remote(full_name: &str) -> Remote {
    let dir = TempDir::new().unwrap();
    let seed = dir.path().join("seed");
    let bare = dir.path().join("remote.git");

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(&seed, &opts).unwrap();
    fs::write(seed.join("README.md"), "# original\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .unwrap();

    RepoBuilder::new()
        .bare(true)
        .clone(seed.to_str().unwrap(), &bare)
        .unwrap();

    let mut record = RepositoryRecord::new(full_name);
    record.clone_url = bare.to_str().unwrap().to_string();
    Remote {
        _dir: dir,
        bare,
        record,
    }
}

fn manager<V: VersionControl>(work: &TempDir, vcs: V) -> RepositoryManager<V> {
    let config = Config::new("secret-token").with_working_dir(work.path());
    RepositoryManager::new(&config, vcs).unwrap()
}

fn head_id(path: &Path) -> git2::Oid {
    Repository::open(path).unwrap().head().unwrap().target().unwrap()
}

/// Files under `dir` whose contents mention `needle`.
fn files_containing(dir: &Path, needle: &str) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            found.extend(files_containing(&path, needle));
        } else if String::from_utf8_lossy(&fs::read(&path).unwrap()).contains(needle) {
            found.push(path);
        }
    }
    found
}

fn dir_names(path: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_setup_twice_is_idempotent() {
    let remote = create_remote("octo/hello");
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::new());

    let first = manager.setup_repository(&remote.record).unwrap();
    assert_eq!(first.path, work.path().join("repos/octo_hello"));
    assert_eq!(first.state, CheckoutState::Cloned);
    let head = head_id(&first.path);

    // A dirty tracked file is reset by the second setup.
    fs::write(first.path.join("README.md"), "local edits\n").unwrap();

    let second = manager.setup_repository(&remote.record).unwrap();
    assert_eq!(second.path, first.path);
    assert_eq!(head_id(&second.path), head);
    assert_eq!(
        fs::read_to_string(second.path.join("README.md")).unwrap(),
        "# original\n"
    );
    assert_eq!(dir_names(manager.repos_dir()), vec!["octo_hello"]);
}

#[test]
fn test_clone_failure_leaves_no_directory() {
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::new());
    let mut record = RepositoryRecord::new("octo/missing");
    record.clone_url = work.path().join("does-not-exist.git").to_string_lossy().into_owned();

    let err = manager.setup_repository(&record).unwrap_err();
    assert!(matches!(err, RepoWalkerError::Clone { .. }));
    assert!(!manager.checkout_path(&record).exists());
}

#[test]
fn test_commit_without_changes() {
    let remote = create_remote("octo/hello");
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::new());

    let mut checkout = manager.setup_repository(&remote.record).unwrap();
    manager.create_branch(&mut checkout, "docs/empty").unwrap();
    let before = head_id(&checkout.path);

    let outcome = manager.commit(&mut checkout, "nothing").unwrap();
    assert_eq!(outcome, CommitOutcome::NoChanges);
    assert_eq!(checkout.state, CheckoutState::BranchCreated);
    assert_eq!(head_id(&checkout.path), before);
}

#[test]
fn test_push_reaches_remote_with_plain_origin() {
    let remote = create_remote("octo/hello");
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::with_token("secret-token"));

    let mut checkout = manager.setup_repository(&remote.record).unwrap();
    manager.create_branch(&mut checkout, "docs/auto-gen-test").unwrap();
    MockGenerator
        .generate(&checkout.path, "DOCS.md", &remote.record)
        .unwrap();

    let outcome = manager
        .commit_and_push(&mut checkout, "docs: add auto-generated DOCS.md")
        .unwrap();
    assert_eq!(outcome, CommitOutcome::Committed);
    assert_eq!(checkout.state, CheckoutState::Pushed);

    let bare = Repository::open_bare(&remote.bare).unwrap();
    let pushed = bare
        .find_branch("docs/auto-gen-test", BranchType::Local)
        .unwrap();
    let commit = pushed.get().peel_to_commit().unwrap();
    assert_eq!(commit.message(), Some("docs: add auto-generated DOCS.md"));
    assert_eq!(commit.id(), head_id(&checkout.path));

    let origin = Git2Backend::new().remote_url(&checkout.path, "origin").unwrap();
    assert_eq!(origin, remote.record.clone_url);
    assert!(files_containing(&checkout.path.join(".git"), "secret-token").is_empty());
}

#[test]
fn test_cleanup_deletes_feature_branch() {
    let remote = create_remote("octo/hello");
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::new());

    let mut checkout = manager.setup_repository(&remote.record).unwrap();
    manager.create_branch(&mut checkout, "docs/to-delete").unwrap();
    manager.cleanup_branch(&mut checkout).unwrap();

    let repo = Repository::open(&checkout.path).unwrap();
    assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    assert!(repo.find_branch("docs/to-delete", BranchType::Local).is_err());
    assert_eq!(checkout.state, CheckoutState::CleanedUp);
    assert_eq!(checkout.feature_branch, None);

    manager.remove_checkout(&mut checkout).unwrap();
    assert!(!checkout.path.exists());
    assert_eq!(checkout.state, CheckoutState::Absent);
}

#[test]
fn test_cleanup_all_empties_repos_dir() {
    let first = create_remote("octo/one");
    let second = create_remote("octo/two");
    let work = TempDir::new().unwrap();
    let manager = manager(&work, Git2Backend::new());

    manager.setup_repository(&first.record).unwrap();
    manager.setup_repository(&second.record).unwrap();
    assert_eq!(dir_names(manager.repos_dir()), vec!["octo_one", "octo_two"]);

    manager.cleanup_all().unwrap();
    assert!(manager.repos_dir().is_dir());
    assert!(dir_names(manager.repos_dir()).is_empty());
}

#[test]
fn test_temporary_working_dir_removed_on_drop() {
    let manager = RepositoryManager::new(&Config::new("t"), Git2Backend::new()).unwrap();
    let dir = manager.working_dir().to_path_buf();
    assert!(dir.join("repos").is_dir());

    drop(manager);
    assert!(!dir.exists());
}

#[test]
fn test_fixed_working_dir_survives_drop() {
    let work = TempDir::new().unwrap();
    drop(manager(&work, Git2Backend::new()));
    assert!(work.path().join("repos").is_dir());
}

#[test]
fn test_git_binary_lifecycle() {
    if std::process::Command::new("git").arg("--version").output().is_err() {
        eprintln!("git not installed, skipping");
        return;
    }

    let remote = create_remote("octo/hello");
    let work = TempDir::new().unwrap();
    // No global or system config, so no identity is configured anywhere.
    let git = GitBinary::new()
        .with_token("secret-token")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_NOSYSTEM", "1");
    let manager = manager(&work, git);

    let mut checkout = manager.setup_repository(&remote.record).unwrap();
    manager.create_branch(&mut checkout, "docs/binary").unwrap();
    assert_eq!(
        manager.commit(&mut checkout, "empty").unwrap(),
        CommitOutcome::NoChanges
    );

    fs::write(checkout.path.join("NOTES.md"), "notes\n").unwrap();
    assert_eq!(
        manager.commit_and_push(&mut checkout, "docs: notes").unwrap(),
        CommitOutcome::Committed
    );

    let bare = Repository::open_bare(&remote.bare).unwrap();
    let pushed = bare.find_branch("docs/binary", BranchType::Local).unwrap();
    let commit = pushed.get().peel_to_commit().unwrap();
    assert_eq!(commit.author().name(), Some("repowalker"));
    assert_eq!(commit.author().email(), Some("repowalker@users.noreply.github.com"));
    assert!(files_containing(&checkout.path.join(".git"), "secret-token").is_empty());

    manager.cleanup_branch(&mut checkout).unwrap();
    let repo = Repository::open(&checkout.path).unwrap();
    assert!(repo.find_branch("docs/binary", BranchType::Local).is_err());
}
