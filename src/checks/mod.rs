//! Check run lifecycle: open a pending check, conclude it exactly once.
//!
//! [`CheckReporter::open`] returns a [`CheckRunHandle`] that
//! [`CheckReporter::finalize`] consumes, so a handle cannot be concluded
//! twice. The handle keeps the `started_at` timestamp taken when the check
//! was opened; the completion timestamp is taken at finalize time.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::DigError;
use crate::github::{
    CheckConclusion, CheckRunGateway, CheckRunId, CheckRunOutput, CheckRunUpdate, NewCheckRun,
};

/// Largest summary GitHub accepts on a check run, in bytes.
pub const MAX_SUMMARY_BYTES: usize = 65_535;

/// Summary used in place of a diff that does not fit on the check run.
pub const TOO_LARGE_SUMMARY: &str = "Looks like the `electron.d.ts` file changed, but the diff is \
                                     too large to display here. See artifacts on the CI build.";

/// Title of every check concluded because the comparison could not run.
pub const DIGGING_FAILED_TITLE: &str = "Digging Failed";

/// Terminal result to report on a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Conclusion shown on the check.
    pub conclusion: CheckConclusion,
    /// Check title.
    pub title: String,
    /// Markdown summary; bounded to [`MAX_SUMMARY_BYTES`] when reported.
    pub summary: String,
}

impl CheckOutcome {
    /// Builds an outcome from borrowed parts.
    #[must_use]
    pub fn new(conclusion: CheckConclusion, title: &str, summary: impl Into<String>) -> Self {
        Self {
            conclusion,
            title: title.to_owned(),
            summary: summary.into(),
        }
    }

    /// A failure concluded with the [`DIGGING_FAILED_TITLE`] title.
    #[must_use]
    pub fn digging_failed(summary: impl Into<String>) -> Self {
        Self::new(CheckConclusion::Failure, DIGGING_FAILED_TITLE, summary)
    }
}

/// Local mirror of an open check run.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckRunHandle {
    id: CheckRunId,
    head_sha: String,
    started_at: DateTime<Utc>,
}

impl CheckRunHandle {
    /// Identifier assigned by GitHub.
    #[must_use]
    pub const fn id(&self) -> CheckRunId {
        self.id
    }

    /// Commit the check is attached to.
    #[must_use]
    pub fn head_sha(&self) -> &str {
        &self.head_sha
    }

    /// When the check was opened.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Opens and concludes check runs through a [`CheckRunGateway`].
pub struct CheckReporter<'gateway, G>
where
    G: CheckRunGateway + ?Sized,
{
    gateway: &'gateway G,
}

impl<'gateway, G> CheckReporter<'gateway, G>
where
    G: CheckRunGateway + ?Sized,
{
    /// Creates a reporter over `gateway`.
    #[must_use]
    pub const fn new(gateway: &'gateway G) -> Self {
        Self { gateway }
    }

    /// Creates a pending check run for `head_sha`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the check cannot be created.
    pub async fn open(
        &self,
        name: &str,
        head_sha: &str,
        details_url: Option<&str>,
    ) -> Result<CheckRunHandle, DigError> {
        let started_at = Utc::now();
        let request = NewCheckRun::in_progress(name, head_sha, details_url);
        let id = self.gateway.create_check_run(&request).await?;
        info!(check_run_id = id.0, %head_sha, name, "opened check run");
        Ok(CheckRunHandle {
            id,
            head_sha: head_sha.to_owned(),
            started_at,
        })
    }

    /// Concludes the check run behind `handle`.
    ///
    /// Summaries over [`MAX_SUMMARY_BYTES`] are replaced with
    /// [`TOO_LARGE_SUMMARY`].
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the update is rejected; the failure is
    /// also logged with the check run id.
    pub async fn finalize(
        &self,
        handle: CheckRunHandle,
        outcome: &CheckOutcome,
    ) -> Result<(), DigError> {
        let update = CheckRunUpdate {
            conclusion: outcome.conclusion,
            started_at: handle.started_at,
            completed_at: Utc::now(),
            output: CheckRunOutput {
                title: outcome.title.clone(),
                summary: bound_summary(outcome.summary.clone()),
            },
        };

        match self.gateway.update_check_run(handle.id, &update).await {
            Ok(()) => {
                info!(
                    check_run_id = handle.id.0,
                    head_sha = %handle.head_sha,
                    conclusion = outcome.conclusion.as_str(),
                    title = %outcome.title,
                    "concluded check run"
                );
                Ok(())
            }
            Err(update_error) => {
                error!(
                    check_run_id = handle.id.0,
                    head_sha = %handle.head_sha,
                    error = %update_error,
                    "failed to conclude check run"
                );
                Err(update_error)
            }
        }
    }
}

/// Passes `summary` through when it fits, otherwise substitutes
/// [`TOO_LARGE_SUMMARY`].
#[must_use]
pub fn bound_summary(summary: String) -> String {
    if summary.len() > MAX_SUMMARY_BYTES {
        TOO_LARGE_SUMMARY.to_owned()
    } else {
        summary
    }
}

/// Renders the changed-definitions summary, prefixed by `lead_in`.
///
/// When the diff does not fit, the lead-in is kept and the fenced diff is
/// replaced with [`TOO_LARGE_SUMMARY`]; the diff is never truncated.
#[must_use]
pub fn render_changes_summary(lead_in: &str, patch: &str) -> String {
    let rendered = format!(
        "{lead_in}Looks like the `electron.d.ts` file changed.\n\n``````diff\n{patch}\n``````"
    );
    if rendered.len() <= MAX_SUMMARY_BYTES {
        rendered
    } else {
        format!("{lead_in}{TOO_LARGE_SUMMARY}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::github::MockCheckRunGateway;

    fn recording_gateway(updates: Arc<Mutex<Vec<CheckRunUpdate>>>) -> MockCheckRunGateway {
        let mut gateway = MockCheckRunGateway::new();
        gateway
            .expect_create_check_run()
            .withf(|request| request.status == "in_progress" && request.head_sha == "abc123")
            .times(1)
            .returning(|_| Ok(CheckRunId(9)));
        gateway
            .expect_update_check_run()
            .with(eq(CheckRunId(9)), mockall::predicate::always())
            .times(1)
            .returning(move |_, update| {
                updates
                    .lock()
                    .expect("updates lock")
                    .push(update.clone());
                Ok(())
            });
        gateway
    }

    #[tokio::test]
    async fn finalize_preserves_started_at_and_stamps_completion() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let gateway = recording_gateway(Arc::clone(&updates));
        let reporter = CheckReporter::new(&gateway);

        let handle = reporter
            .open("Artifact Comparison", "abc123", Some("https://example.test/pr/1"))
            .await
            .expect("open should succeed");
        let started_at = handle.started_at();
        reporter
            .finalize(handle, &CheckOutcome::digging_failed("no artifacts"))
            .await
            .expect("finalize should succeed");

        let recorded = updates.lock().expect("updates lock");
        let [update] = recorded.as_slice() else {
            panic!("expected exactly one update, got {}", recorded.len());
        };
        assert_eq!(update.started_at, started_at);
        assert!(update.completed_at >= started_at);
        assert_eq!(update.conclusion, CheckConclusion::Failure);
        assert_eq!(update.output.title, DIGGING_FAILED_TITLE);
        assert_eq!(update.output.summary, "no artifacts");
    }

    #[tokio::test]
    async fn finalize_bounds_oversized_summary() {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let gateway = recording_gateway(Arc::clone(&updates));
        let reporter = CheckReporter::new(&gateway);

        let handle = reporter
            .open("Artifact Comparison", "abc123", None)
            .await
            .expect("open should succeed");
        let outcome = CheckOutcome::new(
            CheckConclusion::Neutral,
            "Changes Detected",
            "x".repeat(MAX_SUMMARY_BYTES + 1),
        );
        reporter
            .finalize(handle, &outcome)
            .await
            .expect("finalize should succeed");

        let recorded = updates.lock().expect("updates lock");
        let summary = recorded.first().map(|update| update.output.summary.as_str());
        assert_eq!(summary, Some(TOO_LARGE_SUMMARY));
    }

    #[tokio::test]
    async fn finalize_surfaces_gateway_failure() {
        let mut gateway = MockCheckRunGateway::new();
        gateway
            .expect_create_check_run()
            .returning(|_| Ok(CheckRunId(3)));
        gateway.expect_update_check_run().times(1).returning(|_, _| {
            Err(DigError::Network {
                message: "connection reset".to_owned(),
            })
        });
        let reporter = CheckReporter::new(&gateway);

        let handle = reporter
            .open("Artifact Comparison", "abc123", None)
            .await
            .expect("open should succeed");
        let error = reporter
            .finalize(handle, &CheckOutcome::digging_failed("x"))
            .await
            .expect_err("finalize should fail");

        assert!(matches!(error, DigError::Network { .. }));
    }

    #[rstest]
    #[case::empty(0)]
    #[case::small(128)]
    #[case::at_limit(MAX_SUMMARY_BYTES)]
    fn summaries_within_limit_pass_through(#[case] length: usize) {
        let summary = "a".repeat(length);

        assert_eq!(bound_summary(summary.clone()), summary);
    }

    #[rstest]
    #[case::one_over(MAX_SUMMARY_BYTES + 1)]
    #[case::far_over(MAX_SUMMARY_BYTES * 3)]
    fn summaries_over_limit_are_replaced(#[case] length: usize) {
        assert_eq!(bound_summary("a".repeat(length)), TOO_LARGE_SUMMARY);
    }

    #[rstest]
    fn changes_summary_fences_the_patch() {
        let summary = render_changes_summary("", "-a\n+b");

        assert_eq!(
            summary,
            "Looks like the `electron.d.ts` file changed.\n\n``````diff\n-a\n+b\n``````"
        );
    }

    #[rstest]
    fn changes_summary_keeps_lead_in_when_too_large() {
        let lead_in = "Changes detected despite the presence of 'semver/none' label. ";
        let patch = "+".repeat(MAX_SUMMARY_BYTES);

        let summary = render_changes_summary(lead_in, &patch);

        assert_eq!(summary, format!("{lead_in}{TOO_LARGE_SUMMARY}"));
    }

    #[rstest]
    fn changes_summary_exactly_at_limit_is_kept() {
        let frame = render_changes_summary("", "").len();
        let patch = "+".repeat(MAX_SUMMARY_BYTES - frame);

        let summary = render_changes_summary("", &patch);

        assert_eq!(summary.len(), MAX_SUMMARY_BYTES);
        assert!(summary.contains(&patch));
    }
}
