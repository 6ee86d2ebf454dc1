//! grc CLI Entry Point
//!
//! # Usage
//!
//! ```bash
//! # Sync the default branch of a repository
//! GITHUB_ACCESS_TOKEN=... grc simonrw/rynamodb
//!
//! # Preview the change without publishing
//! grc simonrw/rynamodb --dry-run
//!
//! # Preview the checks of a local checkout, no token needed
//! grc simonrw/rynamodb --dry-run --workflows-dir .github/workflows
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::info;

use grc::config::{parse_arguments, Command, Config, API_URL_ENV, REPOSITORY_ENV, TOKEN_ENVS};
use grc::github::{GitHubClient, LocalWorkflowSource, WorkflowSource};
use grc::sync::{collect_check_names, SyncReport, Synchroniser};
use grc::{APP_NAME, VERSION};

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: grc [OPTIONS] <OWNER/REPO>");
    println!();
    println!("Sets a branch's required status checks to the jobs its workflows run.");
    println!();
    println!("Arguments:");
    println!("  <OWNER/REPO>          Repository (or set {})", REPOSITORY_ENV);
    println!();
    println!("Options:");
    println!("  --branch NAME         Branch to update (default: repository default branch)");
    println!("  --workflows-dir PATH  Read workflows from a local directory");
    println!("  --dry-run             Show the change without publishing it");
    println!("  --strict              Require branches to be up to date before merging");
    println!("  --api-url URL         GitHub API endpoint (or set {})", API_URL_ENV);
    println!("  --verbose             Enable debug logging");
    println!("  --help                Show this help message");
    println!("  --version             Show version information");
    println!();
    println!("Environment:");
    println!("  {}  Access token", TOKEN_ENVS.join(" / "));
}

/// Prints the expanded check list, marking changes against the branch.
fn print_report(report: &SyncReport) {
    println!();
    println!("Required checks for '{}':", report.branch);
    for check in &report.checks {
        if report.diff.added.contains(check) {
            println!("  {} {}", "+".green(), check.green());
        } else {
            println!("    {}", check);
        }
    }
    for check in &report.diff.removed {
        println!("  {} {}", "-".red(), check.red());
    }
    println!();

    if report.published {
        println!("{}", "Required checks updated.".green().bold());
    } else if report.diff.is_empty() {
        println!("{}", "Dry run: no changes.".yellow());
    } else {
        println!("{}", "Dry run: nothing published.".yellow());
    }
}

/// Prints check names computed without a branch to compare against.
fn print_checks(checks: &[String]) {
    println!();
    println!("Required checks:");
    for check in checks {
        println!("    {}", check);
    }
}

async fn run_config(config: Config) -> grc::Result<()> {
    let local = config.workflows_dir.as_ref().map(LocalWorkflowSource::new);

    let Some(token) = config.token.as_deref() else {
        // Offline dry run: no branch to compare with
        if let Some(source) = &local {
            let checks = collect_check_names(source).await?;
            print_checks(&checks);
        }
        return Ok(());
    };

    let client = GitHubClient::new(token, &config.api_url, &config.repository)?;

    let branch = match config.branch {
        Some(ref branch) => branch.clone(),
        None => client.default_branch().await?,
    };
    info!("Repository: {}, branch: {}", config.repository, branch);

    let source: &dyn WorkflowSource = match local {
        Some(ref local) => local,
        None => &client,
    };

    let mut synchroniser = Synchroniser::new(source, &client);
    synchroniser.set_dry_run(config.dry_run);
    synchroniser.set_strict(config.strict);

    let report = synchroniser.run(&branch).await?;
    print_report(&report);

    Ok(())
}

/// Main application entry point.
#[tokio::main]
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let command = parse_arguments(&args, |name| env::var(name).ok()).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    let config = match command {
        Command::Help => {
            print_usage();
            return Ok(());
        }
        Command::Version => {
            println!("{} {}", APP_NAME, VERSION);
            return Ok(());
        }
        Command::Run(config) => config,
    };

    setup_logging(config.verbose);

    if config.dry_run {
        info!("Mode: DRY RUN (required checks will not change)");
    }

    run_config(config).await?;
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
