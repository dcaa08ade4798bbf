//! Gateway for creating and concluding check runs.

use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

use crate::error::DigError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{ApiCheckRun, CheckRunId, CheckRunUpdate, NewCheckRun};

use super::CheckRunGateway;
use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

/// Check run gateway bound to one repository.
#[derive(Clone)]
pub struct OctocrabCheckRunGateway {
    client: Octocrab,
    repository: RepositoryLocator,
}

impl OctocrabCheckRunGateway {
    /// Creates a gateway with its own Octocrab client.
    ///
    /// # Errors
    ///
    /// Returns an error if the Octocrab client cannot be built.
    pub fn new(
        token: &PersonalAccessToken,
        repository: RepositoryLocator,
    ) -> Result<Self, DigError> {
        let client = build_octocrab_client(token, repository.api_base().as_str())?;
        Ok(Self { client, repository })
    }

    /// Creates a gateway sharing an existing client.
    #[must_use]
    pub const fn with_client(client: Octocrab, repository: RepositoryLocator) -> Self {
        Self { client, repository }
    }
}

#[async_trait]
impl CheckRunGateway for OctocrabCheckRunGateway {
    async fn create_check_run(&self, request: &NewCheckRun) -> Result<CheckRunId, DigError> {
        let created: ApiCheckRun = self
            .client
            .post(self.repository.check_runs_path(), Some(request))
            .await
            .map_err(|error| map_octocrab_error("create check run", &error))?;
        debug!(check_run_id = created.id, name = %request.name, "created check run");
        Ok(CheckRunId(created.id))
    }

    async fn update_check_run(
        &self,
        id: CheckRunId,
        update: &CheckRunUpdate,
    ) -> Result<(), DigError> {
        let _: ApiCheckRun = self
            .client
            .patch(self.repository.check_run_path(id.0), Some(update))
            .await
            .map_err(|error| map_octocrab_error("update check run", &error))?;
        debug!(
            check_run_id = id.0,
            conclusion = update.conclusion.as_str(),
            "concluded check run"
        );
        Ok(())
    }
}
