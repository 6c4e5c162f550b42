//! Command-line arguments.
//!
//! Every global option can also come from the environment so the CLI can
//! be driven from CI without repeating flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Upload software artifacts to the deployments service
#[derive(Parser, Debug)]
#[command(name = "deploy-cli", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Server base URL
    #[arg(
        long,
        global = true,
        env = "DEPLOY_CLI_SERVER",
        default_value = "https://localhost",
        value_name = "URL"
    )]
    pub server: String,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, global = true, env = "DEPLOY_CLI_SKIP_VERIFY")]
    pub skip_verify: bool,

    /// Token file written by `login` [default: <cache dir>/deploy-cli/authtoken]
    #[arg(long, global = true, env = "DEPLOY_CLI_TOKEN", value_name = "FILE")]
    pub token: Option<PathBuf>,

    /// Give up on the request after this many seconds (no limit by default)
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Dump requests and responses
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with artifacts
    Artifacts(ArtifactsArgs),
}

#[derive(Args, Debug)]
pub struct ArtifactsArgs {
    #[command(subcommand)]
    pub action: ArtifactsAction,
}

#[derive(Subcommand, Debug)]
pub enum ArtifactsAction {
    /// Upload an artifact to the server
    Upload(UploadArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Path to the artifact file
    #[arg(value_name = "ARTIFACT")]
    pub artifact: PathBuf,

    /// Artifact description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level for this crate's targets.
    pub fn log_level(&self) -> &'static str {
        if self.global.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
