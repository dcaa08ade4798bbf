//! Gateways for reporting check runs and reading workflow artifacts through
//! Octocrab.
//!
//! Check reporting sits behind the [`CheckRunGateway`] trait so the
//! orchestrator can be tested against mocks; workflow access implements the
//! provider traits from [`crate::ci`].

mod actions;
mod checks;
mod client;
mod error_mapping;

pub use actions::OctocrabActionsGateway;
pub use checks::OctocrabCheckRunGateway;
pub use client::build_octocrab_client;

use async_trait::async_trait;

use crate::error::DigError;
use crate::github::models::{CheckRunId, CheckRunUpdate, NewCheckRun};

/// Gateway that can create and conclude check runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckRunGateway: Send + Sync {
    /// Creates a check run and returns its identifier.
    async fn create_check_run(&self, request: &NewCheckRun) -> Result<CheckRunId, DigError>;

    /// Updates an existing check run.
    async fn update_check_run(
        &self,
        id: CheckRunId,
        update: &CheckRunUpdate,
    ) -> Result<(), DigError>;
}
