//! CLI for repowalker.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use repowalker::config::{DEFAULT_API_URL, DEFAULT_ENV_FILE, store_token};
use repowalker::prelude::*;
use repowalker::generate::validate_output_file;
use repowalker::prompt::{require_confirmation, select_organization};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "repowalker")]
#[command(author, version, about = "Walk through GitHub repositories", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Enable verbose output (repeat for more: -v info, -vv debug, -vvv trace)
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// File the token is read from and stored in
    #[arg(global = true, long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// GitHub REST API base URL
    #[arg(global = true, long, default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories with details and statistics
    List(ListArgs),

    /// Generate a file in each repository and open pull requests
    Process(ProcessArgs),

    /// Store a GitHub token in the env file
    Auth {
        /// Token to store; read from stdin when omitted
        #[arg(long)]
        token: Option<String>,
    },
}

/// Which repositories to work on.
#[derive(Args, Default)]
struct SelectionArgs {
    /// Maximum number of repositories to fetch
    #[arg(short = 'm', long)]
    limit: Option<usize>,

    /// Organization to fetch repositories from
    #[arg(long, conflicts_with_all = ["personal", "all"])]
    org: Option<String>,

    /// Only repositories you own
    #[arg(long, conflicts_with = "all")]
    personal: bool,

    /// Every repository you can access, including collaborations
    #[arg(long)]
    all: bool,
}

#[derive(Args, Default)]
struct ListArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Show the language distribution report
    #[arg(short, long)]
    languages: bool,

    /// Save repository data as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ProcessArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// File to generate in each repository, relative to its root
    #[arg(long, default_value = "README.md", value_parser = parse_output_file)]
    file: String,

    /// Prefix of the feature branch name
    #[arg(long, default_value = "docs/auto-gen")]
    branch_prefix: String,

    /// Keep checkouts and feature branches after processing
    #[arg(long)]
    no_cleanup: bool,

    /// Content service used to generate the file
    #[arg(long, value_enum, default_value_t = ContentService::Mock)]
    service: ContentService,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Keep checkouts in this directory instead of a temporary one
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Version control backend
    #[arg(long, value_enum, default_value_t = VcsBackend::Git2)]
    vcs: VcsBackend,
}

fn parse_output_file(value: &str) -> std::result::Result<String, String> {
    validate_output_file(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing(&cli.global);

    match cli.command.unwrap_or_else(|| Commands::List(ListArgs::default())) {
        Commands::List(args) => cmd_list(&cli.global, args),
        Commands::Process(args) => cmd_process(&cli.global, args),
        Commands::Auth { token } => cmd_auth(&cli.global, token),
    }
}

/// Install a stderr subscriber whose level follows the `-v` count.
fn configure_tracing(global: &GlobalArgs) {
    let level_filter = match global.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level_filter)
        .with_ansi(console::colors_enabled_stderr())
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber was already installed");
    }
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let config = Config::load(&global.env_file).context("Failed to load configuration")?;
    Ok(config.with_api_url(&global.api_url))
}

fn make_client(config: &Config) -> GitHubClient {
    GitHubClient::new(config).with_progress(|count| {
        println!("{}", style(format!("Fetched {} repositories so far...", count)).dim());
    })
}

fn cmd_list(global: &GlobalArgs, args: ListArgs) -> Result<()> {
    let config = load_config(global)?;
    let client = make_client(&config);

    let repos = fetch_repositories(&client, &args.selection)?;

    print!("\n{}", render_summary(&repos, SUMMARY_LIMIT, chrono::Utc::now()));

    if args.languages {
        print!("\n{}", render_language_report(&repos));
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&repos)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "\n{}",
            style(format!("Saved repository data to {}", path.display())).green()
        );
    }

    Ok(())
}

fn cmd_process(global: &GlobalArgs, args: ProcessArgs) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(dir) = &args.work_dir {
        config = config.with_working_dir(dir);
    }
    let client = make_client(&config);

    let repos = fetch_repositories(&client, &args.selection)?;
    if repos.is_empty() {
        println!("{}", style("No repositories found to process.").yellow());
        return Ok(());
    }

    if !args.yes {
        match require_confirmation(&repos, &mut io::stdin().lock(), &mut io::stdout()) {
            Ok(()) => {}
            Err(RepoWalkerError::UserAbort) => {
                println!("{}", style("Operation cancelled.").yellow());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let report = match args.vcs {
        VcsBackend::Git2 => {
            let vcs = Git2Backend::with_token(config.token.as_str());
            run_processing(&config, &client, vcs, &args, &repos)?
        }
        VcsBackend::Binary => {
            let vcs = GitBinary::new().with_token(config.token.as_str());
            run_processing(&config, &client, vcs, &args, &repos)?
        }
    };

    print_report(&report);
    Ok(())
}

fn run_processing<V: VersionControl>(
    config: &Config,
    client: &GitHubClient,
    vcs: V,
    args: &ProcessArgs,
    repos: &[RepositoryRecord],
) -> Result<ProcessingReport> {
    let manager =
        RepositoryManager::new(config, vcs).context("Failed to prepare working directory")?;
    let processor =
        RepoProcessor::new(manager, client, args.service.generator()).cleanup(!args.no_cleanup);

    let options = ProcessOptions {
        branch_prefix: args.branch_prefix.clone(),
        output_file: args.file.clone(),
    };
    Ok(processor.process_repositories(repos, &options))
}

fn print_report(report: &ProcessingReport) {
    if !report.successes.is_empty() {
        println!("\n{}", style("Successfully processed repositories:").green());
        for success in &report.successes {
            println!(
                "  {} -> {}",
                style(&success.repo.full_name).cyan(),
                success.pull_request.html_url
            );
        }
    }

    if !report.failures.is_empty() {
        println!("\n{}", style("Failed to process repositories:").red());
        for failure in &report.failures {
            println!("  {}: {}", style(&failure.repo.full_name).red(), failure.error);
        }
    }
}

/// Resolve the selection flags, prompting for an organization when none is given.
fn fetch_repositories(
    client: &GitHubClient,
    args: &SelectionArgs,
) -> Result<Vec<RepositoryRecord>> {
    let user = client
        .get_authenticated_user()
        .context("Failed to get authenticated user")?;
    println!("{} {}", style("Authenticated as").green(), style(&user.login).cyan());

    let selection = if args.all {
        println!("\n{}", style("Fetching all accessible repositories.").green());
        RepoSelection::Accessible
    } else if args.personal {
        println!("\n{}", style("Fetching personal repositories (owned by you).").green());
        RepoSelection::Owned
    } else if let Some(org) = &args.org {
        println!("\n{} {}", style("Using organization:").green(), style(org).cyan());
        RepoSelection::Organization(org.clone())
    } else {
        prompt_selection(client)?
    };

    let repos = client
        .list_repos(&selection, args.limit)
        .context("Failed to list repositories")?;
    Ok(repos)
}

fn prompt_selection(client: &GitHubClient) -> Result<RepoSelection> {
    let organizations = client
        .list_organizations()
        .context("Failed to list organizations")?;

    if organizations.is_empty() {
        println!(
            "\n{}",
            style("No organizations found. Using personal repositories.").yellow()
        );
        return Ok(RepoSelection::Owned);
    }

    match select_organization(&organizations, &mut io::stdin().lock(), &mut io::stdout())? {
        Some(org) => {
            println!("\n{} {}", style("Selected organization:").green(), style(&org).cyan());
            Ok(RepoSelection::Organization(org))
        }
        None => {
            println!("\n{}", style("Fetching personal repositories (owned by you).").green());
            Ok(RepoSelection::Owned)
        }
    }
}

fn cmd_auth(global: &GlobalArgs, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => {
            eprint!("Enter your GitHub token: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("No token provided");
    }

    store_token(&global.env_file, token)
        .with_context(|| format!("Failed to store token in {}", global.env_file.display()))?;
    println!(
        "{}",
        style(format!("Token saved to {}", global.env_file.display())).green()
    );
    Ok(())
}
