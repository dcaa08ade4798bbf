//! Bounded-retry artifact retrieval.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use super::scratch::ScratchDir;
use super::{ArtifactBundle, ArtifactName};
use crate::ci::{ArtifactEntry, ArtifactGateway, BuildId};
use crate::error::DigError;

/// Fetches the dig artifacts of a build through an [`ArtifactGateway`].
pub struct ArtifactFetcher<'gateway, G>
where
    G: ArtifactGateway + ?Sized,
{
    gateway: &'gateway G,
    delay: Duration,
    scratch_root: Option<PathBuf>,
}

impl<'gateway, G> ArtifactFetcher<'gateway, G>
where
    G: ArtifactGateway + ?Sized,
{
    /// Creates a fetcher that waits `delay` between failed attempts.
    #[must_use]
    pub const fn new(gateway: &'gateway G, delay: Duration) -> Self {
        Self {
            gateway,
            delay,
            scratch_root: None,
        }
    }

    /// Places scratch directories under `root` instead of the process temp
    /// directory.
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Fetches the artifacts of `build`, resolving the listing at most
    /// `max_attempts` times.
    ///
    /// Never fails: exhausted retries, an empty listing, and download or
    /// extraction problems all yield a bundle whose missing names say what
    /// could not be retrieved.
    pub async fn fetch(&self, build: BuildId, max_attempts: u32) -> ArtifactBundle {
        let Some((listing, attempt)) = self.resolve_listing(build, max_attempts).await else {
            error!(
                %build,
                max_attempts,
                remaining_attempts = 0_u32,
                "giving up on artifact listing"
            );
            return ArtifactBundle::all_missing();
        };

        if listing.is_empty() {
            error!(
                %build,
                remaining_attempts = max_attempts - attempt,
                "no artifacts found for run"
            );
            return ArtifactBundle::all_missing();
        }

        match self.collect(&listing).await {
            Ok(bundle) => {
                info!(%build, missing = ?bundle.missing(), "artifacts collected");
                bundle
            }
            Err(collect_error) => {
                error!(%build, error = %collect_error, "failed to collect artifacts");
                ArtifactBundle::all_missing()
            }
        }
    }

    /// Returns the listing together with the attempt that produced it.
    async fn resolve_listing(
        &self,
        build: BuildId,
        max_attempts: u32,
    ) -> Option<(Vec<ArtifactEntry>, u32)> {
        for attempt in 1..=max_attempts {
            info!(%build, attempt, "fetching artifact listing");
            match self.gateway.list_artifacts(build).await {
                Ok(listing) => return Some((listing, attempt)),
                Err(list_error) => {
                    let remaining_attempts = max_attempts - attempt;
                    error!(
                        %build,
                        remaining_attempts,
                        error = %list_error,
                        "failed to fetch artifact listing, backing off"
                    );
                    if remaining_attempts > 0 {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }
        None
    }

    async fn collect(&self, listing: &[ArtifactEntry]) -> Result<ArtifactBundle, DigError> {
        let scratch = match &self.scratch_root {
            Some(root) => ScratchDir::acquire_in(root)?,
            None => ScratchDir::acquire()?,
        };

        self.gateway.materialise(listing, scratch.path()).await?;
        let bundle = read_expected_files(scratch.path()).await?;

        if let Err(release_error) = scratch.release() {
            warn!(error = %release_error, "failed to remove scratch directory");
        }
        Ok(bundle)
    }
}

/// Scans the top level of `dir` for the expected artifact files.
async fn read_expected_files(dir: &Path) -> Result<ArtifactBundle, DigError> {
    let mut bundle = ArtifactBundle::all_missing();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|error| DigError::io("read scratch directory", &error))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| DigError::io("read scratch directory", &error))?
    {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(ArtifactName::from_file_name) else {
            continue;
        };
        match tokio::fs::read_to_string(entry.path()).await {
            Ok(content) => bundle = bundle.with(name, content),
            Err(read_error) => warn!(artifact = %name, error = %read_error, "unreadable artifact"),
        }
    }

    Ok(bundle)
}
