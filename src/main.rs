//! Archaeologist service entrypoint.
//!
//! Loads configuration, then serves the GitHub webhook receiver until the
//! process receives Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use archaeologist::github::build_octocrab_client;
use archaeologist::telemetry::init_tracing;
use archaeologist::webhook::Dispatcher;
use archaeologist::{AppState, ArchaeologistConfig, DigError, GitHubDispatcher, router};
use ortho_config::OrthoConfig;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(load_error) => {
            let _subscriber_installed = init_tracing(false, Level::INFO);
            error!(error = %load_error, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let _subscriber_installed = init_tracing(config.json_logs, Level::INFO);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!(error = %run_error, "archaeologist stopped");
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`DigError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<ArchaeologistConfig, DigError> {
    ArchaeologistConfig::load().map_err(|error| DigError::Configuration {
        message: error.to_string(),
    })
}

async fn run(config: ArchaeologistConfig) -> Result<(), DigError> {
    config.validate()?;
    let token = config.resolve_token()?;
    let address = config.listen_addr()?;
    let client = build_octocrab_client(&token, &config.api_base)?;

    let circleci = config.circleci_settings();
    if circleci.is_none() {
        warn!("no CircleCI token configured; pull request triggers will be ignored");
    }
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(GitHubDispatcher::new(
        client,
        config.api_base.as_str(),
        config.orchestrator_config(),
        circleci,
    ));
    let app = router(AppState::new(dispatcher, &config.check_name));

    let listener = TcpListener::bind(address)
        .await
        .map_err(|error| DigError::io("binding listener", &error))?;
    info!(%address, check_name = %config.check_name, "listening for webhook deliveries");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| DigError::io("serving webhooks", &error))
}

async fn shutdown_signal() {
    if let Err(signal_error) = tokio::signal::ctrl_c().await {
        warn!(error = %signal_error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
