//! Polling loop that waits for a CI build to reach a terminal state.

use std::time::Duration;

use tracing::{info, warn};

use super::{BuildGateway, BuildId, BuildState};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_ALLOWED_FAILURES: u32 = 3;

/// Interval and failure allowance for build polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two status requests.
    pub interval: Duration,
    /// Consecutive status request failures tolerated before giving up.
    pub allowed_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            allowed_failures: DEFAULT_ALLOWED_FAILURES,
        }
    }
}

/// Terminal result of waiting for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The build succeeded.
    Passed,
    /// The build reported a failure.
    Failed,
    /// Status requests kept failing until the allowance ran out.
    GaveUp,
}

/// Polls `gateway` until `build` passes or fails.
///
/// A successful status request, including one reporting a running build,
/// resets the failure allowance, so it caps consecutive failures rather than
/// failures over the whole wait. There is no wall-clock deadline: a build that stays running is polled indefinitely.
pub async fn wait_for_build<G>(gateway: &G, build: BuildId, policy: PollPolicy) -> BuildOutcome
where
    G: BuildGateway + ?Sized,
{
    let mut failures_left = policy.allowed_failures;
    loop {
        info!(%build, "polling build state");
        match gateway.build_state(build).await {
            Ok(BuildState::Passed) => {
                info!(%build, "build passed");
                return BuildOutcome::Passed;
            }
            Ok(BuildState::Failed) => {
                info!(%build, "build failed");
                return BuildOutcome::Failed;
            }
            Ok(BuildState::Running) => failures_left = policy.allowed_failures,
            Err(error) => {
                warn!(%build, failures_left, %error, "build status request failed");
                if failures_left == 0 {
                    return BuildOutcome::GaveUp;
                }
                failures_left -= 1;
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}
