//! Command-Line Configuration
//!
//! Resolves arguments and environment variables into a [`Config`].
//! Environment lookups go through a closure so parsing can be tested
//! without touching the process environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::GrcError;
use crate::github::client::DEFAULT_API_URL;

/// Environment variable holding the repository when no argument is given.
pub const REPOSITORY_ENV: &str = "GRC_REPOSITORY";

/// Environment variables searched for an access token, in order.
pub const TOKEN_ENVS: &[&str] = &["GITHUB_ACCESS_TOKEN", "GITHUB_TOKEN"];

/// Environment variable overriding the API endpoint (GitHub Enterprise).
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GrcError::Config(format!("expected OWNER/REPO, got '{}'", s));

        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Settings for one synchronisation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repository: Repository,
    pub token: Option<String>,
    /// Target branch; the repository default branch when unset
    pub branch: Option<String>,
    /// Read workflows from this directory instead of the API
    pub workflows_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub strict: bool,
    pub api_url: String,
    pub verbose: bool,
}

impl Config {
    /// Checks that the settings allow the run to reach every collaborator
    /// it needs.
    ///
    /// Only a dry run over local workflow files can go without a token.
    pub fn validate(&self) -> Result<(), GrcError> {
        let offline = self.dry_run && self.workflows_dir.is_some();
        if self.token.is_none() && !offline {
            return Err(GrcError::Config(format!(
                "no access token, set {}",
                TOKEN_ENVS.join(" or ")
            )));
        }
        Ok(())
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
    Version,
}

/// Parses command-line arguments (program name first) into a [`Command`].
pub fn parse_arguments<F>(args: &[String], env: F) -> Result<Command, GrcError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut repository = None;
    let mut branch = None;
    let mut workflows_dir = None;
    let mut api_url = None;
    let mut dry_run = false;
    let mut strict = false;
    let mut verbose = false;

    let mut i = 1; // Skip program name
    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--dry-run" => dry_run = true,
            "--strict" => strict = true,
            "--verbose" | "-v" => verbose = true,
            "--branch" | "--workflows-dir" | "--api-url" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| GrcError::Config(format!("{} requires a value", arg)))?
                    .clone();
                match arg.as_str() {
                    "--branch" => branch = Some(value),
                    "--workflows-dir" => workflows_dir = Some(PathBuf::from(value)),
                    _ => api_url = Some(value),
                }
            }
            other if other.starts_with('-') => {
                return Err(GrcError::Config(format!("unknown option: {}", other)));
            }
            other => {
                if repository.is_some() {
                    return Err(GrcError::Config(format!("unexpected argument: {}", other)));
                }
                repository = Some(other.to_string());
            }
        }
        i += 1;
    }

    let repository: Repository = repository
        .or_else(|| env(REPOSITORY_ENV))
        .ok_or_else(|| {
            GrcError::Config(format!("no repository given (OWNER/REPO or {})", REPOSITORY_ENV))
        })?
        .parse()?;

    let token = TOKEN_ENVS
        .iter()
        .find_map(|name| env(*name).filter(|t| !t.trim().is_empty()));

    let api_url = api_url
        .or_else(|| env(API_URL_ENV))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let config = Config {
        repository,
        token,
        branch,
        workflows_dir,
        dry_run,
        strict,
        api_url,
        verbose,
    };
    config.validate()?;

    Ok(Command::Run(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("grc")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn env_with(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn run_config(command: Command) -> Config {
        match command {
            Command::Run(config) => config,
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_repository_parse() {
        let repo: Repository = "simonrw/rynamodb".parse().unwrap();
        assert_eq!(repo.owner, "simonrw");
        assert_eq!(repo.name, "rynamodb");
        assert_eq!(repo.to_string(), "simonrw/rynamodb");
    }

    #[test]
    fn test_repository_parse_invalid() {
        assert!("rynamodb".parse::<Repository>().is_err());
        assert!("/rynamodb".parse::<Repository>().is_err());
        assert!("a/b/c".parse::<Repository>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = run_config(
            parse_arguments(
                &args(&["simonrw/rynamodb"]),
                env_with(&[("GITHUB_ACCESS_TOKEN", "secret")]),
            )
            .unwrap(),
        );

        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.branch.is_none());
        assert!(!config.dry_run);
        assert!(!config.strict);
    }

    #[test]
    fn test_all_options() {
        let config = run_config(
            parse_arguments(
                &args(&[
                    "--branch",
                    "develop",
                    "--workflows-dir",
                    ".github/workflows",
                    "--api-url",
                    "https://ghe.example.com/api/v3",
                    "--dry-run",
                    "--strict",
                    "-v",
                    "acme/widgets",
                ]),
                env_with(&[("GITHUB_TOKEN", "fallback")]),
            )
            .unwrap(),
        );

        assert_eq!(config.repository.to_string(), "acme/widgets");
        assert_eq!(config.token.as_deref(), Some("fallback"));
        assert_eq!(config.branch.as_deref(), Some("develop"));
        assert_eq!(config.workflows_dir, Some(PathBuf::from(".github/workflows")));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert!(config.dry_run && config.strict && config.verbose);
    }

    #[test]
    fn test_repository_from_env() {
        let config = run_config(
            parse_arguments(
                &args(&[]),
                env_with(&[(REPOSITORY_ENV, "acme/widgets"), ("GITHUB_ACCESS_TOKEN", "t")]),
            )
            .unwrap(),
        );
        assert_eq!(config.repository.name, "widgets");
    }

    #[test]
    fn test_empty_token_falls_through() {
        let config = run_config(
            parse_arguments(
                &args(&["acme/widgets"]),
                env_with(&[("GITHUB_ACCESS_TOKEN", "  "), ("GITHUB_TOKEN", "fallback")]),
            )
            .unwrap(),
        );
        assert_eq!(config.token.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_token_required_for_remote_run() {
        let result = parse_arguments(&args(&["acme/widgets"]), env_with(&[]));
        assert!(matches!(result, Err(GrcError::Config(_))));
    }

    #[test]
    fn test_offline_dry_run_needs_no_token() {
        let result = parse_arguments(
            &args(&["acme/widgets", "--dry-run", "--workflows-dir", "wf"]),
            env_with(&[]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse_arguments(&args(&["--help"]), env_with(&[])).unwrap(), Command::Help);
        assert_eq!(parse_arguments(&args(&["-V"]), env_with(&[])).unwrap(), Command::Version);
    }

    #[test]
    fn test_option_missing_value() {
        let result = parse_arguments(
            &args(&["acme/widgets", "--branch"]),
            env_with(&[("GITHUB_TOKEN", "t")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_option() {
        let result = parse_arguments(&args(&["--force"]), env_with(&[]));
        assert!(result.is_err());
    }
}
