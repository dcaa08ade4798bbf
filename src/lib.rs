//! Archaeologist library crate.
//!
//! Archaeologist reports a GitHub check run describing how a pull request
//! changes the generated `electron.d.ts` type definitions. It starts or
//! watches a CI "dig" build, collects the new and old definition files the
//! build publishes, diffs them after stripping the version banner, and
//! concludes the check according to the pull request's `semver/*` label.

pub mod artifacts;
pub mod checks;
pub mod ci;
pub mod circleci;
pub mod config;
pub mod dts;
pub mod error;
pub mod github;
pub mod orchestrator;
pub mod policy;
pub mod telemetry;
pub mod webhook;

#[cfg(test)]
mod test_support;

pub use artifacts::{ArtifactBundle, ArtifactFetcher, ArtifactName};
pub use checks::{CheckOutcome, CheckReporter};
pub use ci::{ArtifactGateway, BuildGateway, BuildId, BuildState};
pub use circleci::{CircleCiConfig, CircleCiGateway};
pub use config::ArchaeologistConfig;
pub use error::DigError;
pub use github::{
    CheckConclusion, CheckRunGateway, OctocrabActionsGateway, OctocrabCheckRunGateway,
    PersonalAccessToken, RepositoryLocator,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig, Trigger};
pub use policy::{CheckStatus, SemverLabel, evaluate};
pub use webhook::{AppState, GitHubDispatcher, router};
