use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::cleanup;
use crate::config;
use crate::model::user_map::UserMap;
use crate::providers::ado::AdoClient;
use crate::providers::auth::{jira_auth_header, JiraAuthMethod};
use crate::providers::jira::JiraClient;
use crate::verify::{self, SmokeTest};

/// Checks a Jira to Azure DevOps work item migration.
#[derive(Debug, Parser)]
#[command(name = "jira-ado-check", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete every work item in an ADO project
    Cleanup {
        organization_url: String,
        project: String,
        ado_token: String,
    },
    /// Compare every Jira issue with the work item it was migrated to
    SmokeTest(SmokeTestArgs),
}

#[derive(Debug, clap::Args)]
pub struct SmokeTestArgs {
    pub organization_url: String,
    pub project: String,
    pub ado_token: String,
    pub jira_url: String,
    pub jira_email: String,
    pub jira_token: String,
    pub jira_project: String,
    pub user_mapping_file: PathBuf,
    /// `basic` (e-mail + API token) or `token` (bearer)
    pub auth_method: String,

    /// TOML file overriding the expected area path, status table and field lists
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the selected command and return the process exit code.
pub async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Command::Cleanup {
            organization_url,
            project,
            ado_token,
        } => {
            let ado = AdoClient::new(&organization_url, &project, &ado_token);
            let count = cleanup::run_cleanup(&ado, &project).await?;
            println!("Deleted {count} work items from {project}");
            Ok(0)
        }
        Command::SmokeTest(args) => run_smoke_test(args).await,
    }
}

async fn run_smoke_test(args: SmokeTestArgs) -> Result<u8> {
    let config = config::load_config(args.config.as_deref())?;
    let users = UserMap::load(&args.user_mapping_file)
        .context("Cannot run the smoke test without a user mapping")?;
    tracing::info!(users = users.len(), "Loaded user mapping");

    // An unusable auth method is reported but not fatal; Jira then answers 401.
    let auth_header = match args.auth_method.parse::<JiraAuthMethod>() {
        Ok(method) => Some(jira_auth_header(method, &args.jira_email, &args.jira_token)),
        Err(e) => {
            tracing::error!("{e}");
            None
        }
    };

    let ado = AdoClient::new(&args.organization_url, &args.project, &args.ado_token);
    let jira = JiraClient::new(&args.jira_url, auth_header, config.search_page_size);

    let test = SmokeTest {
        ado_project: args.project,
        jira_project: args.jira_project,
        jira_url: args.jira_url,
        users,
        config,
    };
    let report = verify::run_smoke_test(&ado, &jira, &test).await?;

    report
        .write_to(&mut std::io::stdout().lock())
        .context("Failed to write the smoke test report")?;
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("jira-ado-check").chain(args.iter().copied()))
    }

    #[test]
    fn parse_cleanup_positionals() {
        let cli = parse(&["cleanup", "https://dev.azure.com/acme", "Smoke", "pat"]).unwrap();
        match cli.command {
            Command::Cleanup {
                organization_url,
                project,
                ado_token,
            } => {
                assert_eq!(organization_url, "https://dev.azure.com/acme");
                assert_eq!(project, "Smoke");
                assert_eq!(ado_token, "pat");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_smoke_test_positionals() {
        let cli = parse(&[
            "smoke-test",
            "https://dev.azure.com/acme",
            "Smoke",
            "pat",
            "https://acme.atlassian.net",
            "me@acme.com",
            "jira-token",
            "AB",
            "users.txt",
            "basic",
        ])
        .unwrap();
        let Command::SmokeTest(args) = cli.command else {
            panic!("expected smoke-test");
        };
        assert_eq!(args.jira_project, "AB");
        assert_eq!(args.user_mapping_file, PathBuf::from("users.txt"));
        assert_eq!(args.auth_method, "basic");
        assert!(args.config.is_none());
    }

    #[test]
    fn missing_positional_is_an_error() {
        let result = parse(&["cleanup", "https://dev.azure.com/acme", "Smoke"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_and_verbosity_flags() {
        let cli = parse(&[
            "-vv",
            "smoke-test",
            "o",
            "p",
            "t",
            "j",
            "e",
            "jt",
            "AB",
            "users.txt",
            "token",
            "--config",
            "verify.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::SmokeTest(args) = cli.command else {
            panic!("expected smoke-test");
        };
        assert_eq!(args.config, Some(PathBuf::from("verify.toml")));
    }

    #[tokio::test]
    async fn smoke_test_without_mapping_file_fails() {
        let cli = parse(&[
            "smoke-test",
            "https://dev.azure.com/acme",
            "Smoke",
            "pat",
            "https://acme.atlassian.net",
            "me@acme.com",
            "jira-token",
            "AB",
            "/nonexistent/users.txt",
            "basic",
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(format!("{err:#}").contains("user mapping"));
    }
}
