//! CI provider abstractions: starting dig builds, reading their state, and
//! retrieving the artifacts they produce.
//!
//! Two providers implement these traits: GitHub Actions (see
//! [`crate::github::OctocrabActionsGateway`]) and CircleCI (see
//! [`crate::circleci::CircleCiGateway`]). The orchestrator only sees the
//! traits, so tests substitute mocks.

mod wait;

pub use wait::{BuildOutcome, PollPolicy, wait_for_build};

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::DigError;

/// Identifier of a CI build, workflow job, or workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildId(u64);

impl BuildId {
    /// Wraps a raw provider identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// State of a build as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Queued or still executing.
    Running,
    /// Finished successfully.
    Passed,
    /// Finished unsuccessfully (failed, errored, cancelled).
    Failed,
}

/// Parameters for a dig build comparing a pull request head with its base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigRequest {
    /// Commit whose definitions should be generated.
    pub dig_spot: String,
    /// Branch the pull request targets.
    pub base_branch: String,
    /// Clone URL of the fork carrying the head commit, when it is not the
    /// base repository.
    pub additional_remote: Option<String>,
}

/// One entry in a provider's artifact listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    /// Provider identifier for the artifact.
    pub id: u64,
    /// Artifact name or path.
    pub name: String,
    /// Direct download URL when the provider exposes one.
    pub url: Option<String>,
}

/// Gateway that can start dig builds and report their state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildGateway: Send + Sync {
    /// Starts a dig build and returns its identifier.
    async fn trigger_dig(&self, request: &DigRequest) -> Result<BuildId, DigError>;

    /// Reads the current state of a build.
    async fn build_state(&self, build: BuildId) -> Result<BuildState, DigError>;
}

/// Gateway that can list and materialise build artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactGateway: Send + Sync {
    /// Resolves a build identifier to its artifact listing.
    ///
    /// A returned error is treated as transient by the fetcher and retried.
    async fn list_artifacts(&self, build: BuildId) -> Result<Vec<ArtifactEntry>, DigError>;

    /// Downloads the listed artifacts and writes their files into `dir`.
    async fn materialise(&self, listing: &[ArtifactEntry], dir: &Path) -> Result<(), DigError>;
}
