//! Run orchestration: one check run per triggering event, concluded exactly
//! once.
//!
//! Each run moves through [`RunState::Started`] (the pending check is
//! opened), [`RunState::AwaitingBuild`] (a dig build is triggered and polled,
//! or an already finished one is located by id), [`RunState::Comparing`]
//! (artifacts are fetched, normalised, and diffed) and finally
//! [`RunState::Concluded`]. Every branch after the check is opened produces a
//! [`CheckOutcome`], so the check is finalized on build failures, missing
//! artifacts, and diff failures alike.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{Instrument, debug, error, info_span, warn};

use crate::artifacts::{ArtifactFetcher, CompleteArtifacts};
use crate::checks::{CheckOutcome, CheckReporter, render_changes_summary};
use crate::ci::{
    ArtifactGateway, BuildGateway, BuildId, BuildOutcome, DigRequest, PollPolicy, wait_for_build,
};
use crate::dts::{normalize, render_diff};
use crate::error::DigError;
use crate::github::CheckRunGateway;
use crate::policy::{CheckStatus, VALID_CHANGES, VALID_NO_CHANGES, evaluate};

/// Name of the check run the orchestrator reports on.
pub const DEFAULT_REPORT_CHECK_NAME: &str = "Artifact Comparison";

const MISSING_ARTIFACTS_SUMMARY: &str = "Although the .d.ts build appears to have succeeded, \
                                         artifacts were not generated correctly for us to compare";
const BUILD_FAILED_SUMMARY: &str =
    "The dig build failed, so there were no `electron.d.ts` artifacts to compare.";
const GAVE_UP_SUMMARY: &str =
    "We lost track of the dig build after repeated failures to read its status.";

/// Pull request opened, reopened, or synchronised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestTrigger {
    /// Head commit of the pull request.
    pub head_sha: String,
    /// Branch the pull request targets.
    pub base_branch: String,
    /// Clone URL of the head repository when it is a fork.
    pub fork_remote: Option<String>,
    /// Pull request page, used as the check's details link.
    pub details_url: Option<String>,
    /// Label names in the order GitHub lists them.
    pub labels: Vec<String>,
}

/// A CI check run finished after being started by other infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCompletedTrigger {
    /// Commit the completed check ran against.
    pub head_sha: String,
    /// Link to the completed check.
    pub details_url: Option<String>,
    /// Build, run, or job id the artifacts belong to.
    pub build_or_run_id: BuildId,
}

/// Event that starts an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A pull request lifecycle event; a dig build is triggered and polled.
    PullRequest(PullRequestTrigger),
    /// A completed CI check; the finished build is located by id.
    CheckCompleted(CheckCompletedTrigger),
}

impl Trigger {
    /// Commit the check run is attached to.
    #[must_use]
    pub fn head_sha(&self) -> &str {
        match self {
            Self::PullRequest(trigger) => &trigger.head_sha,
            Self::CheckCompleted(trigger) => &trigger.head_sha,
        }
    }

    /// Details link for the check run.
    #[must_use]
    pub fn details_url(&self) -> Option<&str> {
        match self {
            Self::PullRequest(trigger) => trigger.details_url.as_deref(),
            Self::CheckCompleted(trigger) => trigger.details_url.as_deref(),
        }
    }

    /// Labels to evaluate, when the trigger carries any.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        match self {
            Self::PullRequest(trigger) => Some(trigger.labels.as_slice()),
            Self::CheckCompleted(_) => None,
        }
    }

    /// Short name used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PullRequest(_) => "pull_request",
            Self::CheckCompleted(_) => "check_completed",
        }
    }
}

/// Stage of an orchestration run, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Opening the pending check.
    Started,
    /// Triggering or locating the dig build.
    AwaitingBuild,
    /// Fetching and comparing artifacts.
    Comparing,
    /// The check has been finalized.
    Concluded,
}

impl RunState {
    /// Log label of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AwaitingBuild => "awaiting_build",
            Self::Comparing => "comparing",
            Self::Concluded => "concluded",
        }
    }
}

/// Explicit settings for an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Name of the check run created for each trigger.
    pub check_name: String,
    /// Artifact listing attempts before giving up.
    pub retry_attempts: u32,
    /// Delay between artifact listing attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Delay between build status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Consecutive status poll failures tolerated.
    pub allowed_poll_failures: u32,
    /// Directory scratch directories are created under; the process temp
    /// directory when unset.
    pub scratch_root: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            check_name: DEFAULT_REPORT_CHECK_NAME.to_owned(),
            retry_attempts: 5,
            retry_delay_ms: 10_000,
            poll_interval_ms: 5_000,
            allowed_poll_failures: 3,
            scratch_root: None,
        }
    }
}

impl OrchestratorConfig {
    /// Delay between artifact listing attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Build polling policy.
    #[must_use]
    pub const fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            allowed_failures: self.allowed_poll_failures,
        }
    }
}

/// Drives one trigger to a concluded check run.
pub struct Orchestrator<'run, C, P>
where
    C: CheckRunGateway + ?Sized,
    P: BuildGateway + ArtifactGateway + ?Sized,
{
    checks: &'run C,
    provider: &'run P,
    config: &'run OrchestratorConfig,
}

impl<'run, C, P> Orchestrator<'run, C, P>
where
    C: CheckRunGateway + ?Sized,
    P: BuildGateway + ArtifactGateway + ?Sized,
{
    /// Creates an orchestrator reporting through `checks` and building
    /// through `provider`.
    #[must_use]
    pub const fn new(checks: &'run C, provider: &'run P, config: &'run OrchestratorConfig) -> Self {
        Self {
            checks,
            provider,
            config,
        }
    }

    /// Runs the state machine for `trigger` and returns the reported outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only when the check run cannot be created or its
    /// final update is rejected. Build, artifact, and diff problems are
    /// reported on the check instead.
    pub async fn run(&self, trigger: &Trigger) -> Result<CheckOutcome, DigError> {
        let span = info_span!("dig", head_sha = %trigger.head_sha(), trigger = trigger.kind());
        self.run_inner(trigger).instrument(span).await
    }

    async fn run_inner(&self, trigger: &Trigger) -> Result<CheckOutcome, DigError> {
        let reporter = CheckReporter::new(self.checks);
        enter(RunState::Started);
        let handle = reporter
            .open(
                &self.config.check_name,
                trigger.head_sha(),
                trigger.details_url(),
            )
            .await?;

        let outcome = self.decide(trigger).await;

        reporter.finalize(handle, &outcome).await?;
        enter(RunState::Concluded);
        Ok(outcome)
    }

    async fn decide(&self, trigger: &Trigger) -> CheckOutcome {
        enter(RunState::AwaitingBuild);
        let build = match self.await_build(trigger).await {
            Ok(build) => build,
            Err(outcome) => return outcome,
        };

        enter(RunState::Comparing);
        let mut fetcher = ArtifactFetcher::new(self.provider, self.config.retry_delay());
        if let Some(root) = &self.config.scratch_root {
            fetcher = fetcher.with_scratch_root(root);
        }
        let bundle = fetcher.fetch(build, self.config.retry_attempts).await;
        if !bundle.is_complete() {
            debug!(%build, missing = ?bundle.missing(), "dig artifacts incomplete");
        }
        match bundle.into_documents() {
            Some(artifacts) => compare(trigger.labels(), &artifacts),
            None => {
                warn!(%build, "dig artifacts missing or empty");
                CheckOutcome::digging_failed(MISSING_ARTIFACTS_SUMMARY)
            }
        }
    }

    async fn await_build(&self, trigger: &Trigger) -> Result<BuildId, CheckOutcome> {
        let build = match trigger {
            Trigger::PullRequest(pull_request) => {
                let request = DigRequest {
                    dig_spot: pull_request.head_sha.clone(),
                    base_branch: pull_request.base_branch.clone(),
                    additional_remote: pull_request.fork_remote.clone(),
                };
                self.provider.trigger_dig(&request).await.map_err(|trigger_error| {
                    error!(error = %trigger_error, "failed to trigger dig build");
                    CheckOutcome::digging_failed(format!(
                        "The dig build could not be started: {trigger_error}"
                    ))
                })?
            }
            Trigger::CheckCompleted(completed) => completed.build_or_run_id,
        };

        match wait_for_build(self.provider, build, self.config.poll_policy()).await {
            BuildOutcome::Passed => Ok(build),
            BuildOutcome::Failed => Err(CheckOutcome::digging_failed(BUILD_FAILED_SUMMARY)),
            BuildOutcome::GaveUp => {
                error!(%build, "gave up polling dig build");
                Err(CheckOutcome::digging_failed(GAVE_UP_SUMMARY))
            }
        }
    }
}

fn enter(state: RunState) {
    debug!(state = state.as_str(), "entering state");
}

/// Compares normalised documents and chooses the reported outcome.
fn compare(labels: Option<&[String]>, artifacts: &CompleteArtifacts) -> CheckOutcome {
    let old_document = normalize(&artifacts.old_document);
    let new_document = normalize(&artifacts.new_document);
    let has_changes = old_document != new_document;
    let policy = labels.map(|names| evaluate(names, has_changes));
    debug!(has_changes, dig_spot = %artifacts.dig_spot, "compared definitions");

    if !has_changes {
        return outcome_from(policy.unwrap_or(VALID_NO_CHANGES), None);
    }

    match render_diff(&old_document, &new_document) {
        Ok(patch) => outcome_from(policy.unwrap_or(VALID_CHANGES), Some(&patch)),
        Err(diff_error) => {
            error!(error = %diff_error, "failed to render definitions diff");
            CheckOutcome::digging_failed(format!(
                "The `electron.d.ts` artifacts differ but could not be diffed: {diff_error}"
            ))
        }
    }
}

fn outcome_from(status: CheckStatus, patch: Option<&str>) -> CheckOutcome {
    let summary = patch.map_or_else(
        || status.summary.to_owned(),
        |rendered| render_changes_summary(status.summary, rendered),
    );
    CheckOutcome::new(status.conclusion, status.title, summary)
}
