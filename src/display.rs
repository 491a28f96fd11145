//! Console rendering of repository listings and language statistics.
//!
//! Everything here returns a `String`; the binary decides where it goes.

use crate::github::RepositoryRecord;
use chrono::{DateTime, Utc};
use console::style;
use std::collections::HashMap;
use std::fmt::{self, Write};

/// Entries shown by [`render_summary`] before truncating.
pub const SUMMARY_LIMIT: usize = 20;

const BAR_WIDTH: usize = 50;
const BAR_CHAR: char = '█';

/// Sort by stars plus watchers, most popular first. Ties keep their order.
pub fn sort_by_popularity(repos: &[RepositoryRecord]) -> Vec<&RepositoryRecord> {
    let mut sorted: Vec<_> = repos.iter().collect();
    sorted.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
    sorted
}

/// "3 days ago", "1 hour ago", "just now". Unknown timestamps render as "unknown".
pub fn format_relative_time(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(time) = time else {
        return "unknown".into();
    };

    let delta = now.signed_duration_since(time);
    let days = delta.num_days();
    let (amount, unit) = if days >= 365 {
        (days / 365, "year")
    } else if days >= 30 {
        (days / 30, "month")
    } else if days > 0 {
        (days, "day")
    } else if delta.num_hours() > 0 {
        (delta.num_hours(), "hour")
    } else if delta.num_minutes() > 0 {
        (delta.num_minutes(), "minute")
    } else {
        return "just now".into();
    };

    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}

/// Repository size from kilobytes: `N KB` below 1024, `X.Y MB` from there.
pub fn format_size(size_kb: u64) -> String {
    if size_kb >= 1024 {
        format!("{:.1} MB", size_kb as f64 / 1024.0)
    } else {
        format!("{} KB", size_kb)
    }
}

/// Detail block for one repository, prefixed by its 1-based index.
pub fn render_repository(repo: &RepositoryRecord, index: usize, now: DateTime<Utc>) -> String {
    let bar = style(" | ").dim();
    let description = if repo.description.is_empty() {
        "No description"
    } else {
        &repo.description
    };

    let mut out = String::new();
    let _ = writeln!(out, "{:2}. {}", index, style(&repo.full_name).cyan());
    let _ = writeln!(out, "    {} {}", style("Description:").green(), description);
    let _ = writeln!(
        out,
        "    {} {}{}{} {}{}{} {}{}{} {}",
        style("Language:").green(),
        repo.language.as_deref().unwrap_or("Unknown"),
        bar,
        style("Stars:").green(),
        repo.stargazers_count,
        bar,
        style("Forks:").green(),
        repo.forks_count,
        bar,
        style("Size:").green(),
        format_size(repo.size),
    );
    let _ = writeln!(
        out,
        "    {} {}{}{} {}",
        style("Updated:").green(),
        format_relative_time(repo.updated_at, now),
        bar,
        style("Created:").green(),
        format_relative_time(repo.created_at, now),
    );
    let _ = writeln!(out, "    {} {}", style("URL:").green(), repo.html_url);
    out
}

/// The most popular repositories, at most `limit` of them.
pub fn render_summary(repos: &[RepositoryRecord], limit: usize, now: DateTime<Utc>) -> String {
    if repos.is_empty() {
        return format!("{}\n", style("No repositories found.").yellow());
    }

    let mut out = format!(
        "{}\n\n",
        style(format!("Found {} repositories:", repos.len())).green()
    );
    let sorted = sort_by_popularity(repos);
    for (i, repo) in sorted.iter().take(limit).enumerate() {
        out.push_str(&render_repository(repo, i + 1, now));
        out.push('\n');
    }
    if repos.len() > limit {
        let _ = writeln!(out, "... and {} more repositories.", repos.len() - limit);
    }
    out
}

/// How many repositories use one language.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageStat {
    pub language: String,
    pub count: usize,
    /// Share of all repositories, including those without a language.
    pub percentage: f64,
}

impl fmt::Display for LanguageStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({:.1}%)", self.language, self.count, self.percentage)
    }
}

/// Language counts, most common first; ties keep first-seen order.
pub fn language_stats(repos: &[RepositoryRecord]) -> Vec<LanguageStat> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for language in repos.iter().filter_map(|r| r.language.as_deref()) {
        let count = counts.entry(language).or_insert(0);
        if *count == 0 {
            order.push(language);
        }
        *count += 1;
    }

    let total = repos.len() as f64;
    let mut stats: Vec<_> = order
        .into_iter()
        .map(|language| {
            let count = counts[language];
            LanguageStat {
                language: language.to_string(),
                count,
                percentage: count as f64 / total * 100.0,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Boxed language distribution table with one bar block per 2%.
pub fn render_language_report(repos: &[RepositoryRecord]) -> String {
    if repos.is_empty() {
        return String::new();
    }

    let stats = language_stats(repos);
    let lang_width = stats
        .iter()
        .map(|s| s.language.chars().count())
        .max()
        .unwrap_or(10)
        .max("LANGUAGE".len());
    let count_width = stats
        .iter()
        .map(|s| s.count.to_string().len())
        .max()
        .unwrap_or(3)
        .max("COUNT".len());
    // "│ " + lang + 2 + count + 2 + pct(10) + 2 + bar + " "
    let inner = 1 + lang_width + 2 + count_width + 2 + 10 + 2 + BAR_WIDTH + 1;

    let border = |s: &str| style(s.to_string()).cyan();
    let mut out = String::new();

    let _ = writeln!(out, "{}", border(&format!("╔{}╗", "═".repeat(inner))));
    let title = "LANGUAGE DISTRIBUTION REPORT";
    let left = inner.saturating_sub(title.len()) / 2;
    let right = inner.saturating_sub(title.len() + left);
    let _ = writeln!(
        out,
        "{}{}{}{}{}",
        border("║"),
        " ".repeat(left),
        style(title).green(),
        " ".repeat(right),
        border("║")
    );
    let _ = writeln!(out, "{}", border(&format!("╠{}╣", "═".repeat(inner))));

    let header = format!(
        " {:<lw$}  {:>cw$}  {:<10}  {:<bw$} ",
        "LANGUAGE",
        "COUNT",
        "PERCENTAGE",
        "DISTRIBUTION (each █ = 2%)",
        lw = lang_width,
        cw = count_width,
        bw = BAR_WIDTH
    );
    let _ = writeln!(out, "{}{}{}", border("║"), style(header).yellow(), border("║"));
    let _ = writeln!(out, "{}", border(&format!("╠{}╣", "─".repeat(inner))));

    for stat in &stats {
        let blocks = ((stat.percentage / 2.0) as usize).min(BAR_WIDTH);
        let bar = BAR_CHAR.to_string().repeat(blocks);
        let bar = if stat.percentage > 50.0 {
            style(bar).green()
        } else if stat.percentage > 20.0 {
            style(bar).yellow()
        } else {
            style(bar).red()
        };
        let _ = writeln!(
            out,
            "{} {:<lw$}  {:>cw$}  {:<10}  {}{} {}",
            border("║"),
            stat.language,
            stat.count,
            format!("{:5.1}%", stat.percentage),
            bar,
            " ".repeat(BAR_WIDTH - blocks),
            border("║"),
            lw = lang_width,
            cw = count_width,
        );
    }
    let _ = writeln!(out, "{}", border(&format!("╚{}╝", "═".repeat(inner))));

    let _ = writeln!(
        out,
        "\n{} Found {} different languages across {} repositories",
        style("Summary:").green(),
        stats.len(),
        repos.len()
    );
    if stats.len() > 5 {
        let top: usize = stats.iter().take(5).map(|s| s.count).sum();
        let share = top as f64 / repos.len() as f64 * 100.0;
        let _ = writeln!(
            out,
            "{}",
            style(format!(
                "Top 5 languages account for {:.1}% of all repositories",
                share
            ))
            .yellow()
        );
    }
    out
}
