//! GitHub Actions provider: resolves workflow jobs to their run's artifacts.
//!
//! Builds are identified by the workflow job id carried on the completed
//! check run. The job is resolved to its run, the run's artifact listing is
//! read, and the first artifact's zip archive is downloaded and unpacked.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::ArtifactId;
use octocrab::params::actions::ArchiveFormat;
use tracing::{debug, warn};

use crate::ci::{ArtifactEntry, ArtifactGateway, BuildGateway, BuildId, BuildState, DigRequest};
use crate::error::DigError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator};
use crate::github::models::{ApiArtifactList, ApiJob};

use super::client::build_octocrab_client;
use super::error_mapping::map_octocrab_error;

/// GitHub Actions gateway bound to one repository.
#[derive(Clone)]
pub struct OctocrabActionsGateway {
    client: Octocrab,
    repository: RepositoryLocator,
}

impl OctocrabActionsGateway {
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

    async fn fetch_job(&self, job: BuildId) -> Result<ApiJob, DigError> {
        self.client
            .get::<ApiJob, _, _>(self.repository.job_path(job.get()), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("workflow job", &error))
    }
}

#[async_trait]
impl BuildGateway for OctocrabActionsGateway {
    async fn trigger_dig(&self, _request: &DigRequest) -> Result<BuildId, DigError> {
        Err(DigError::Unsupported {
            provider: "GitHub Actions",
            operation: "triggering a dig build",
        })
    }

    async fn build_state(&self, build: BuildId) -> Result<BuildState, DigError> {
        Ok(self.fetch_job(build).await?.build_state())
    }
}

#[async_trait]
impl ArtifactGateway for OctocrabActionsGateway {
    async fn list_artifacts(&self, build: BuildId) -> Result<Vec<ArtifactEntry>, DigError> {
        let job = self.fetch_job(build).await?;
        debug!(job_id = %build, run_id = job.run_id, "resolved workflow run");

        let listing = self
            .client
            .get::<ApiArtifactList, _, _>(
                self.repository.run_artifacts_path(job.run_id),
                None::<&()>,
            )
            .await
            .map_err(|error| map_octocrab_error("workflow run artifacts", &error))?;

        Ok(listing.artifacts.into_iter().map(Into::into).collect())
    }

    async fn materialise(&self, listing: &[ArtifactEntry], dir: &Path) -> Result<(), DigError> {
        let Some(first) = listing.first() else {
            return Ok(());
        };
        if listing.len() > 1 {
            warn!(
                artifact = %first.name,
                ignored = listing.len() - 1,
                "run has several artifacts, using the first"
            );
        }

        let archive = self
            .client
            .actions()
            .download_artifact(
                self.repository.owner().as_str(),
                self.repository.repository().as_str(),
                ArtifactId(first.id),
                ArchiveFormat::Zip,
            )
            .await
            .map_err(|error| map_octocrab_error("artifact download", &error))?;

        let bytes = archive.to_vec();
        let target = dir.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_zip(bytes, &target))
            .await
            .map_err(|error| DigError::Archive {
                message: format!("archive extraction task failed: {error}"),
            })?
    }
}

/// Unpacks a zip archive held in memory into `target`.
pub(crate) fn unpack_zip(bytes: Vec<u8>, target: &Path) -> Result<(), DigError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|error| {
        DigError::Archive {
            message: format!("artifact is not a zip archive: {error}"),
        }
    })?;
    archive.extract(target).map_err(|error| DigError::Archive {
        message: format!("failed to unpack artifact: {error}"),
    })
}
