//! Interactive prompts: organization selection and processing confirmation.

use crate::error::{RepoWalkerError, Result};
use crate::github::{OrganizationRecord, RepositoryRecord};
use console::style;
use std::io::{self, BufRead, Write};

/// Repositories listed before asking for confirmation.
const PREVIEW_COUNT: usize = 5;

/// Ask which organization to use.
///
/// Returns `None` for personal repositories: empty input, `0`, or end of
/// input. Anything that is not a number in range prompts again.
pub fn select_organization<R: BufRead, W: Write>(
    organizations: &[OrganizationRecord],
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<String>> {
    writeln!(output, "\n{}", style("Your Organizations:").green())?;
    writeln!(output, "0. {}", style("Personal Repositories").cyan())?;
    for (i, org) in organizations.iter().enumerate() {
        writeln!(
            output,
            "{}. {} - {}",
            i + 1,
            style(&org.login).cyan(),
            org.description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("No description")
        )?;
    }

    loop {
        write!(
            output,
            "\n{}",
            style(format!(
                "Select an organization (0-{}) or press Enter for personal repos: ",
                organizations.len()
            ))
            .green()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let choice = line.trim();
        if choice.is_empty() {
            return Ok(None);
        }

        match choice.parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= organizations.len() => {
                return Ok(Some(organizations[n - 1].login.clone()));
            }
            Ok(_) => writeln!(
                output,
                "{}",
                style(format!(
                    "Invalid choice. Please select a number between 0 and {}.",
                    organizations.len()
                ))
                .red()
            )?,
            Err(_) => writeln!(output, "{}", style("Please enter a valid number.").red())?,
        }
    }
}

/// List the first repositories and ask for a `yes`. Anything else declines.
pub fn confirm_processing<R: BufRead, W: Write>(
    repos: &[RepositoryRecord],
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    writeln!(
        output,
        "\n{}",
        style(format!("About to process {} repositories:", repos.len())).yellow()
    )?;
    for (i, repo) in repos.iter().take(PREVIEW_COUNT).enumerate() {
        writeln!(output, "  {}. {}", i + 1, style(&repo.full_name).cyan())?;
    }
    if repos.len() > PREVIEW_COUNT {
        writeln!(output, "  ... and {} more repositories", repos.len() - PREVIEW_COUNT)?;
    }

    write!(output, "\n{}", style("Do you want to continue? (yes/no): ").yellow())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

/// Like [`confirm_processing`], but a declined prompt is a [`RepoWalkerError::UserAbort`].
pub fn require_confirmation<R: BufRead, W: Write>(
    repos: &[RepositoryRecord],
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    if confirm_processing(repos, input, output)? {
        Ok(())
    } else {
        Err(RepoWalkerError::UserAbort)
    }
}
