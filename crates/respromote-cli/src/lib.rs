//! respromote - RuleApp promotion between Rule Execution Servers
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Copies the highest version of a RuleApp, and the managed XOM libraries and
//! archives its rulesets reference, from a source server to a destination
//! server. Runs are dry by default; pass `--execute` to deploy.
//!
//! # Files
//!
//! ```text
//! ./respromote.toml        # endpoints and promotion settings
//! ./data/
//! ├── {ruleapp}_ruleapp.jar
//! └── {xom}               # one file per promoted XOM, version-less
//! ```

pub mod cmd;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG: &str = "respromote.toml";

#[derive(Debug, Parser)]
#[command(name = "respromote")]
#[command(
    author,
    version = env!("RESPROMOTE_VERSION"),
    about = "Promote RuleApps and their XOMs between Rule Execution Servers"
)]
pub struct Cli {
    /// Configuration file with source and destination endpoints
    #[arg(long, global = true, env = "RESPROMOTE_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Promote the highest version of a RuleApp (dry run unless --execute)
    Replicate(ReplicateArgs),
    /// Remove staged archives from the staging directory
    Clean {
        /// Staging directory (overrides the config file)
        #[arg(long)]
        stage_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ReplicateArgs {
    /// RuleApp name on the source server
    pub ruleapp: String,

    /// Deploy to the destination; without it nothing is posted
    #[arg(long)]
    pub execute: bool,

    /// Staging directory (overrides the config file)
    #[arg(long)]
    pub stage_dir: Option<PathBuf>,

    /// Create the staging directory if it does not exist
    #[arg(long)]
    pub create_stage_dir: bool,

    /// Do not re-deploy XOMs already present on the destination
    #[arg(long)]
    pub skip_existing_xom: bool,

    /// Print the promotion report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replicate_defaults_to_dry_run() {
        let cli = Cli::parse_from(["respromote", "replicate", "loan"]);
        match cli.command {
            Commands::Replicate(args) => {
                assert_eq!(args.ruleapp, "loan");
                assert!(!args.execute);
                assert!(!args.skip_existing_xom);
                assert_eq!(args.stage_dir, None);
            }
            Commands::Clean { .. } => panic!("expected replicate"),
        }
    }

    #[test]
    fn test_replicate_flags() {
        let cli = Cli::parse_from([
            "respromote",
            "--config",
            "prod.toml",
            "replicate",
            "loan",
            "--execute",
            "--stage-dir",
            "/tmp/stage",
            "--skip-existing-xom",
        ]);
        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        let Commands::Replicate(args) = cli.command else {
            panic!("expected replicate");
        };
        assert!(args.execute);
        assert!(args.skip_existing_xom);
        assert_eq!(args.stage_dir, Some(PathBuf::from("/tmp/stage")));
    }

    #[test]
    fn test_ruleapp_name_is_required() {
        assert!(Cli::try_parse_from(["respromote", "replicate"]).is_err());
    }
}
