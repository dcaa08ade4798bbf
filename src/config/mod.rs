//! Service configuration loaded from CLI, environment, and files.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in service defaults
//! 2. **Configuration file** – `.archaeologist.toml` in the current
//!    directory, home directory, or XDG config directory
//! 3. **Environment variables** – `ARCHAEOLOGIST_*`, plus the legacy
//!    `GITHUB_TOKEN` and `CIRCLE_TOKEN` fallbacks
//! 4. **Command-line arguments** – `--token`, `--check-name`, and friends
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! check_name = "Archaeologist Dig"
//! circleci_token = "circle_example"
//! circleci_project = "electron/electron"
//! listen = "0.0.0.0:3000"
//! ```

use std::env;
use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::circleci::{DEFAULT_CIRCLECI_BASE, DEFAULT_CIRCLECI_BRANCH};
use crate::error::DigError;
use crate::github::{DEFAULT_API_BASE, PersonalAccessToken};
use crate::orchestrator::{DEFAULT_REPORT_CHECK_NAME, OrchestratorConfig};
use crate::webhook::CircleCiSettings;

/// Name of the completed check run that starts a comparison.
pub const DEFAULT_CHECK_NAME: &str = "Archaeologist Dig";
/// Address the webhook receiver binds to.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_DELAY_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_ALLOWED_POLL_FAILURES: u32 = 3;

/// Service configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use archaeologist::ArchaeologistConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = ArchaeologistConfig::load().expect("failed to load configuration");
/// let token = config.resolve_token().expect("token required");
/// let settings = config.orchestrator_config();
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "ARCHAEOLOGIST",
    discovery(
        dotfile_name = ".archaeologist.toml",
        config_file_name = "archaeologist.toml",
        app_name = "archaeologist"
    )
)]
pub struct ArchaeologistConfig {
    /// GitHub token used for check runs and Actions artifacts.
    ///
    /// Falls back to `GITHUB_TOKEN` when unset.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// GitHub API base URL.
    #[ortho_config()]
    pub api_base: String,

    /// Name of the completed check run that triggers a comparison
    /// (`ARCHAEOLOGIST_CHECK_NAME`).
    #[ortho_config(cli_short = 'c')]
    pub check_name: String,

    /// Name of the check run this service reports on.
    #[ortho_config()]
    pub report_check_name: String,

    /// Artifact listing attempts before giving up.
    #[ortho_config()]
    pub retry_attempts: u32,

    /// Delay between artifact listing attempts, in milliseconds.
    #[ortho_config()]
    pub retry_delay_ms: u64,

    /// Delay between build status polls, in milliseconds.
    #[ortho_config()]
    pub poll_interval_ms: u64,

    /// Consecutive build status failures tolerated while polling.
    #[ortho_config()]
    pub allowed_poll_failures: u32,

    /// CircleCI API token; pull request triggers are ignored without one.
    ///
    /// Falls back to `CIRCLE_TOKEN` when unset.
    #[ortho_config()]
    pub circleci_token: Option<String>,

    /// CircleCI API root.
    #[ortho_config()]
    pub circleci_base: String,

    /// CircleCI project slug; defaults to the delivering repository.
    #[ortho_config()]
    pub circleci_project: Option<String>,

    /// Branch the CircleCI dig job runs on.
    #[ortho_config()]
    pub circleci_branch: String,

    /// Socket address the webhook receiver binds to.
    #[ortho_config()]
    pub listen: String,

    /// Emits logs as JSON lines.
    ///
    /// Environment variables cannot set this flag because `ortho_config`
    /// does not load boolean values from the environment.
    #[ortho_config()]
    pub json_logs: bool,
}

impl Default for ArchaeologistConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            check_name: DEFAULT_CHECK_NAME.to_owned(),
            report_check_name: DEFAULT_REPORT_CHECK_NAME.to_owned(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            allowed_poll_failures: DEFAULT_ALLOWED_POLL_FAILURES,
            circleci_token: None,
            circleci_base: DEFAULT_CIRCLECI_BASE.to_owned(),
            circleci_project: None,
            circleci_branch: DEFAULT_CIRCLECI_BRANCH.to_owned(),
            listen: DEFAULT_LISTEN.to_owned(),
            json_logs: false,
        }
    }
}

impl ArchaeologistConfig {
    /// Resolves the GitHub token from configuration or the legacy
    /// `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::MissingToken`] when no source provides a
    /// non-blank value.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, DigError> {
        let token = self
            .token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(DigError::MissingToken)?;
        PersonalAccessToken::new(token)
    }

    /// Resolves the CircleCI token from configuration or `CIRCLE_TOKEN`.
    #[must_use]
    pub fn resolve_circleci_token(&self) -> Option<String> {
        self.circleci_token
            .clone()
            .or_else(|| env::var("CIRCLE_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// CircleCI settings, when a token is available.
    #[must_use]
    pub fn circleci_settings(&self) -> Option<CircleCiSettings> {
        self.resolve_circleci_token().map(|token| CircleCiSettings {
            token,
            base_url: self.circleci_base.clone(),
            branch: self.circleci_branch.clone(),
            project: self.circleci_project.clone(),
        })
    }

    /// The explicit settings handed to each orchestration run.
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            check_name: self.report_check_name.clone(),
            retry_attempts: self.retry_attempts,
            retry_delay_ms: self.retry_delay_ms,
            poll_interval_ms: self.poll_interval_ms,
            allowed_poll_failures: self.allowed_poll_failures,
            scratch_root: None,
        }
    }

    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::Configuration`] when `listen` is not a socket
    /// address.
    pub fn listen_addr(&self) -> Result<SocketAddr, DigError> {
        self.listen
            .parse()
            .map_err(|error| DigError::Configuration {
                message: format!("listen address '{}' is invalid: {error}", self.listen),
            })
    }

    /// Checks values that cannot be validated by their types alone.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::Configuration`] when the check names are blank or
    /// the trigger and report names collide.
    pub fn validate(&self) -> Result<(), DigError> {
        if self.check_name.trim().is_empty() {
            return Err(DigError::Configuration {
                message: "check_name must not be blank".to_owned(),
            });
        }
        if self.report_check_name.trim().is_empty() {
            return Err(DigError::Configuration {
                message: "report_check_name must not be blank".to_owned(),
            });
        }
        if self.check_name == self.report_check_name {
            return Err(DigError::Configuration {
                message: format!(
                    "check_name and report_check_name are both '{}'; concluding the \
                     report would trigger another comparison",
                    self.check_name
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
