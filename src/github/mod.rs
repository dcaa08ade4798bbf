//! GitHub check runs and GitHub Actions artifacts.
//!
//! This module wraps Octocrab to create and conclude check runs on a
//! repository and to read the artifacts produced by workflow runs. Octocrab
//! errors are mapped into [`crate::error::DigError`] so callers never see
//! transport internals.

pub mod gateway;
pub mod locator;
pub mod models;

pub use gateway::{
    CheckRunGateway, OctocrabActionsGateway, OctocrabCheckRunGateway, build_octocrab_client,
};
pub use locator::{
    DEFAULT_API_BASE, PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner,
};
pub use models::{CheckConclusion, CheckRunId, CheckRunOutput, CheckRunUpdate, NewCheckRun};

#[cfg(test)]
pub use gateway::MockCheckRunGateway;
