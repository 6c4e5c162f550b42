// UI layer: turns parsed arguments into an `UploadClient` call and reports
// the outcome on the terminal. Progress bars are drawn by the client itself
// unless `--no-progress` is given.

use crate::api::{UploadClient, UploadRequest};
use crate::cli::{ArtifactsAction, Cli, Commands, GlobalArgs, UploadArgs};
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Run the selected command to completion.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Artifacts(artifacts) => match artifacts.action {
            ArtifactsAction::Upload(args) => upload(&cli.global, args),
        },
    }
}

/// `artifacts upload`: send one artifact and print a confirmation.
pub fn upload(global: &GlobalArgs, args: UploadArgs) -> Result<()> {
    let client = build_client(global);
    let request = UploadRequest {
        description: args.description,
        artifact_path: args.artifact,
        token_path: global.token.clone().unwrap_or_else(default_token_path),
        no_progress: args.no_progress,
    };
    debug!(
        "uploading {} with token from {}",
        request.artifact_path.display(),
        request.token_path.display()
    );

    client
        .upload_artifact(&request)
        .with_context(|| format!("Upload of {} failed", request.artifact_path.display()))?;

    println!("Upload successful");
    Ok(())
}

/// Client for the configured server, honouring `--skip-verify` and `--timeout`.
pub fn build_client(global: &GlobalArgs) -> UploadClient {
    let transport = HttpTransport::new(global.skip_verify)
        .with_timeout(global.timeout.map(Duration::from_secs));
    UploadClient::new(&global.server, global.skip_verify).with_transport(transport)
}

/// Where `login` leaves the token: `<cache dir>/deploy-cli/authtoken`,
/// falling back to the home directory and then the working directory.
pub fn default_token_path() -> PathBuf {
    let dir = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join("deploy-cli").join("authtoken")
}
