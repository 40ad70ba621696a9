use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};

use crate::engine::state::RunError;
use crate::networking::BungieClient;
use crate::storage::StorageManager;
use crate::workflow::ActionsOutput;

mod checker;
mod engine;
mod env;
mod networking;
mod storage;
mod updater;
mod util;
mod workflow;

#[derive(Parser, Debug)]
#[command(
    name = "d2-manifest-bot",
    author,
    version,
    about = "Keeps a repository copy of the Destiny 2 manifest in sync with Bungie.net"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Bungie.net API key.
    #[arg(long, env = "BUNGIE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Bungie.net origin serving both the Platform API and content files.
    #[arg(long, env = "BUNGIE_API_BASE", default_value = env::DEFAULT_API_BASE)]
    api_base: String,

    /// Repository root holding latest.json, manifest.zip and README.md.
    #[arg(long, env = "MANIFEST_BOT_ROOT", default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare the stored version with Bungie's and publish skip_update.
    Check,
    /// Download the mirrored tables and rewrite the repository files.
    Update,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let api = BungieClient::new(&cli.api_base, cli.api_key);
    let storage = StorageManager::new(&cli.root);

    let result = match cli.command {
        Command::Check => run_check(&api, &storage).await,
        Command::Update => updater::update_manifest(&api, &storage)
            .await
            .map(|version| info!("update: manifest now at version {version}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run_check(api: &BungieClient, storage: &StorageManager) -> Result<(), RunError> {
    let current_version = storage.read_stored_version().await?;
    let mut outputs = ActionsOutput::from_env();
    let decision = checker::check_manifest(api, &current_version, &mut outputs).await?;
    info!("check: skip_update={}", decision.skip_update());
    Ok(())
}

fn report_failure(err: &RunError) {
    match err {
        RunError::Remote { status, code, .. } => {
            error!("run failed: Bungie returned ErrorStatus {status} (ErrorCode {code})");
            workflow::error(&err.to_string());
            workflow::error(&format!(
                "Unable to fetch manifest metadata from Bungie API (ErrorStatus: {status})."
            ));
        }
        RunError::Failed(message) => {
            error!("run failed: {message}");
            workflow::error(message);
        }
    }
}
