//! Content generation for checkouts.

use crate::error::{RepoWalkerError, Result};
use crate::github::RepositoryRecord;
use std::path::{Component, Path, PathBuf};

/// Produces a file inside a checkout.
pub trait ContentGenerator {
    /// Name shown in logs.
    fn name(&self) -> &str;

    /// Write `output_file` inside `checkout_dir` and return its path.
    fn generate(
        &self,
        checkout_dir: &Path,
        output_file: &str,
        repo: &RepositoryRecord,
    ) -> Result<PathBuf>;
}

/// Check that `output_file` names a file inside a checkout.
///
/// Rejects empty and absolute paths, `..` components and anything under
/// `.git`.
pub fn validate_output_file(output_file: &str) -> Result<&Path> {
    let path = Path::new(output_file);
    let invalid = |reason: &str| {
        Err(RepoWalkerError::InvalidConfig(format!(
            "output file {:?} {}",
            output_file, reason
        )))
    };

    if output_file.trim().is_empty() {
        return invalid("is empty");
    }
    if path.is_absolute() || path.has_root() {
        return invalid("must be relative to the repository root");
    }

    let mut normal = path.components().filter(|c| !matches!(c, Component::CurDir));
    match normal.next() {
        None => return invalid("does not name a file"),
        Some(Component::Normal(first)) if first == ".git" => {
            return invalid("must not point into .git");
        }
        _ => {}
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return invalid("must not leave the repository");
    }
    Ok(path)
}

/// Writes a fixed README scaffold.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    /// The scaffold written for `full_name`.
    pub fn render(full_name: &str) -> String {
        format!(
            "# {full_name}\n\
             \n\
             This is auto-generated documentation.\n\
             \n\
             ## Overview\n\
             \n\
             This repository contains code for the project.\n\
             \n\
             ## Usage\n\
             \n\
             Follow the instructions in the code to use this project.\n"
        )
    }
}

impl ContentGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(
        &self,
        checkout_dir: &Path,
        output_file: &str,
        repo: &RepositoryRecord,
    ) -> Result<PathBuf> {
        let path = checkout_dir.join(validate_output_file(output_file)?);
        tracing::info!("generating {} for {}", path.display(), repo.full_name);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Self::render(&repo.full_name)).map_err(|e| {
            RepoWalkerError::Generation {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(path)
    }
}

/// Selectable content services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ContentService {
    /// Deterministic README scaffold.
    #[default]
    Mock,
}

impl ContentService {
    /// Build the generator for this service.
    pub fn generator(self) -> Box<dyn ContentGenerator> {
        match self {
            Self::Mock => Box::new(MockGenerator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_generator_writes_scaffold() {
        let dir = TempDir::new().unwrap();
        let repo = RepositoryRecord::new("octo/hello_world");

        let path = ContentService::Mock
            .generator()
            .generate(dir.path(), "README.md", &repo)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# octo/hello_world\n\nThis is auto-generated documentation.\n"));
        assert!(content.ends_with("Follow the instructions in the code to use this project.\n"));
    }

    #[test]
    fn test_output_in_subdirectory() {
        let dir = TempDir::new().unwrap();
        let repo = RepositoryRecord::new("octo/hello");

        let path = MockGenerator
            .generate(dir.path(), "docs/OVERVIEW.md", &repo)
            .unwrap();

        assert_eq!(path, dir.path().join("docs/OVERVIEW.md"));
        assert!(path.exists());
    }

    #[test]
    fn test_output_outside_checkout_is_rejected() {
        let dir = TempDir::new().unwrap();
        let checkout = dir.path().join("checkout");
        std::fs::create_dir(&checkout).unwrap();
        let repo = RepositoryRecord::new("octo/hello");
        let outside = dir.path().join("escaped.md");

        for output_file in [
            "../escaped.md",
            "docs/../../escaped.md",
            outside.to_str().unwrap(),
            ".git/hooks/pre-commit",
            "",
            ".",
        ] {
            let err = MockGenerator.generate(&checkout, output_file, &repo).unwrap_err();
            assert!(matches!(err, RepoWalkerError::InvalidConfig(_)), "{output_file:?}");
        }
        assert!(!outside.exists());
        assert_eq!(std::fs::read_dir(&checkout).unwrap().count(), 0);
    }

    #[test]
    fn test_relative_output_files_accepted() {
        for output_file in ["README.md", "./docs/OVERVIEW.md", "docs/api/index.md", ".github/README.md"] {
            assert!(validate_output_file(output_file).is_ok(), "{output_file}");
        }
    }
}
