//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Docket CLI - Configure tenants and run document extraction batches.
#[derive(Debug, Parser)]
#[command(name = "docket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration file)
    #[arg(short, long, global = true, env = "DOCKET_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tenants
    Tenants(TenantsArgs),

    /// Inspect and edit configuration
    Config(ConfigArgs),

    /// Run one tenant's batch
    Run(RunArgs),

    /// Run every tenant's batch, one after another
    RunAll,

    /// Inspect and retry results
    Results(ResultsArgs),
}

/// Arguments for the tenants command.
#[derive(Debug, Args)]
pub struct TenantsArgs {
    /// Tenants action
    #[command(subcommand)]
    pub action: TenantsAction,
}

/// Tenant actions.
#[derive(Debug, Subcommand)]
pub enum TenantsAction {
    /// List tenants
    List,

    /// Create or update a tenant
    Add {
        /// Tenant id (lowercase letters, digits, '-' and '_')
        id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Document folder
        #[arg(long)]
        folder: PathBuf,
    },
}

/// Arguments for the config command.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config action
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show a tenant's effective configuration with sources
    Show {
        /// Tenant id
        tenant: String,
    },

    /// Show the global configuration
    Global,

    /// Replace one override section of a tenant
    Set {
        /// Tenant id
        tenant: String,

        /// Section (fields, tags, prompt, output, model)
        section: String,

        /// JSON payload, or @path to read it from a file
        payload: String,
    },

    /// Replace one section of the global configuration
    SetGlobal {
        /// Section (fields, tags, prompt, output, model)
        section: String,

        /// JSON payload, or @path to read it from a file
        payload: String,
    },

    /// Reset one override section of a tenant to the global values
    Reset {
        /// Tenant id
        tenant: String,

        /// Section (fields, tags, prompt, output, model)
        section: String,
    },
}

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Tenant id
    pub tenant: String,

    /// List the worklist without extracting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Only documents whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

/// Arguments for the results command.
#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Results action
    #[command(subcommand)]
    pub action: ResultsAction,
}

/// Result actions.
#[derive(Debug, Subcommand)]
pub enum ResultsAction {
    /// List a tenant's results, newest first
    List {
        /// Tenant id
        tenant: String,

        /// Only results with this status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Page size (at most 250)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Results to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Show one result
    Show {
        /// Tenant id
        tenant: String,

        /// Result id
        id: String,
    },

    /// Retry failed results
    Retry {
        /// Tenant id
        tenant: String,

        /// Retry every failed result
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Result ids to retry
        #[arg(long = "id")]
        ids: Vec<String>,
    },
}

/// Result status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusArg {
    /// Successful extractions
    Success,
    /// Failed extractions
    Failed,
}

impl From<StatusArg> for docket_domain::RecordStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Success => docket_domain::RecordStatus::Success,
            StatusArg::Failed => docket_domain::RecordStatus::Failed,
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["docket", "run", "acme", "--dry-run", "--filter", "march"])
            .unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.tenant, "acme");
                assert!(args.dry_run);
                assert_eq!(args.filter.as_deref(), Some("march"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_retry_ids() {
        let cli = Cli::try_parse_from([
            "docket", "results", "retry", "acme", "--id", "a", "--id", "b",
        ])
        .unwrap();
        match cli.command {
            Command::Results(ResultsArgs {
                action: ResultsAction::Retry { all, ids, .. },
            }) => {
                assert!(!all);
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_retry_all_conflicts_with_ids() {
        let result = Cli::try_parse_from([
            "docket", "results", "retry", "acme", "--all", "--id", "a",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["docket", "run-all", "--format", "json", "--no-color"])
            .unwrap();
        assert_eq!(cli.format, Some(CliFormat::Json));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::RunAll));
    }
}
