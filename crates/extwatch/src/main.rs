mod cli;
mod consent;
mod error;
mod logging;
mod orchestrator;
mod run_lock;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use extwatch_core::{ExtensionId, Marketplace};
use extwatch_editor::ProcessCli;
use extwatch_platform::AppPaths;
use log::{debug, error, info, warn};

use crate::cli::Cli;
use crate::orchestrator::{InstallTarget, Orchestrator, RunOptions, completion_summary};
use crate::run_lock::RunLock;
use crate::settings::AppSettings;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (settings, settings_error) = match AppSettings::load() {
        Ok(settings) => (settings, None),
        Err(error) => (AppSettings::default(), Some(error)),
    };

    let log_file = if cli.dry_run {
        None
    } else {
        AppPaths::new().ok().map(|paths| paths.log_file())
    };
    logging::init_logging(
        cli.debug || settings.debug_logging,
        log_file.as_deref(),
        settings.max_log_size_bytes,
    );
    if let Some(error) = settings_error {
        warn!("{error}; using default settings");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli, settings))
}

async fn run(cli: Cli, settings: AppSettings) -> ExitCode {
    let requested = cli.extension.as_deref().unwrap_or(&settings.extension_id);
    let extension = match requested.parse::<ExtensionId>() {
        Ok(extension) => extension,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let _lock = if cli.dry_run {
        info!("Dry run: nothing will be downloaded, installed or deleted");
        None
    } else {
        match RunLock::acquire_default() {
            Ok(lock) => Some(lock),
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let client = match reqwest::Client::builder()
        .connect_timeout(settings.http_timeout())
        .read_timeout(settings.http_timeout())
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to create HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let marketplace = Marketplace::new(client, settings.marketplace_url.as_str());
    let editors = ProcessCli::new(settings.cli_timeouts());
    let consent = consent::select_channel(cli.dry_run);
    let options = RunOptions {
        extension: extension.clone(),
        target: InstallTarget::from_install_all(cli.install_all),
        dry_run: cli.dry_run,
        settle_delay: settings.settle_delay(),
    };

    info!("Checking {extension} (extwatch {})", env!("CARGO_PKG_VERSION"));
    let mut orchestrator = Orchestrator::new(&editors, &marketplace, consent.as_ref(), options);
    let result = orchestrator.run().await;
    debug!("Run states: {:?}", orchestrator.history());

    match result {
        Ok(outcome) => {
            println!("{}", completion_summary(&extension, &outcome));
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Update failed ({}): {err}", err.kind());
            ExitCode::FAILURE
        }
    }
}
