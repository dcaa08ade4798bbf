//! Check run and workflow models exchanged with the GitHub REST API.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into public domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::ci::{ArtifactEntry, BuildState};

/// Identifier GitHub assigns to a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckRunId(pub u64);

/// Terminal conclusion of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// The check passed.
    Success,
    /// The check failed.
    Failure,
    /// The check needs a human to look at it.
    Neutral,
}

impl CheckConclusion {
    /// Wire name of the conclusion.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
        }
    }
}

/// Request body creating a pending check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCheckRun {
    /// Name shown in the pull request checks list.
    pub name: String,
    /// Commit the check is attached to.
    pub head_sha: String,
    /// Link shown as "Details".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    /// Always `in_progress`; new check runs are never concluded on creation.
    pub status: &'static str,
}

impl NewCheckRun {
    /// Builds an in-progress check run request.
    #[must_use]
    pub fn in_progress(name: &str, head_sha: &str, details_url: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            head_sha: head_sha.to_owned(),
            details_url: details_url.map(ToOwned::to_owned),
            status: "in_progress",
        }
    }
}

/// Title and summary shown on a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRunOutput {
    /// Check title.
    pub title: String,
    /// Markdown summary.
    pub summary: String,
}

/// Request body concluding a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRunUpdate {
    /// Terminal conclusion.
    pub conclusion: CheckConclusion,
    /// When the check was opened.
    #[serde(serialize_with = "serialize_timestamp")]
    pub started_at: DateTime<Utc>,
    /// When the check was concluded.
    #[serde(serialize_with = "serialize_timestamp")]
    pub completed_at: DateTime<Utc>,
    /// Title and summary.
    pub output: CheckRunOutput,
}

fn serialize_timestamp<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCheckRun {
    pub(super) id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiJob {
    pub(super) run_id: u64,
    pub(super) status: Option<String>,
    pub(super) conclusion: Option<String>,
}

impl ApiJob {
    pub(super) fn build_state(&self) -> BuildState {
        match (self.status.as_deref(), self.conclusion.as_deref()) {
            (Some("completed"), Some("success" | "skipped" | "neutral")) => BuildState::Passed,
            (Some("completed"), _) => BuildState::Failed,
            _ => BuildState::Running,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiArtifactList {
    #[serde(default)]
    pub(super) artifacts: Vec<ApiArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiArtifact {
    pub(super) id: u64,
    pub(super) name: String,
    pub(super) archive_download_url: Option<String>,
}

impl From<ApiArtifact> for ArtifactEntry {
    fn from(value: ApiArtifact) -> Self {
        Self {
            id: value.id,
            name: value.name,
            url: value.archive_download_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn new_check_run_serialises_as_in_progress() {
        let request = NewCheckRun::in_progress("Artifact Comparison", "abc123", None);

        let body = serde_json::to_value(&request).expect("request should serialise");

        assert_eq!(
            body,
            json!({
                "name": "Artifact Comparison",
                "head_sha": "abc123",
                "status": "in_progress"
            })
        );
    }

    #[rstest]
    fn update_serialises_timestamps_and_output() {
        let started_at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        let completed_at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 14, 5)
            .single()
            .expect("valid timestamp");
        let update = CheckRunUpdate {
            conclusion: CheckConclusion::Neutral,
            started_at,
            completed_at,
            output: CheckRunOutput {
                title: "Changes Detected".to_owned(),
                summary: "diff".to_owned(),
            },
        };

        let body = serde_json::to_value(&update).expect("update should serialise");

        assert_eq!(
            body,
            json!({
                "conclusion": "neutral",
                "started_at": "2026-01-02T03:04:05Z",
                "completed_at": "2026-01-02T03:14:05Z",
                "output": { "title": "Changes Detected", "summary": "diff" }
            })
        );
    }

    #[rstest]
    #[case(json!({"run_id": 1, "status": "completed", "conclusion": "success"}), BuildState::Passed)]
    #[case(json!({"run_id": 1, "status": "completed", "conclusion": "failure"}), BuildState::Failed)]
    #[case(json!({"run_id": 1, "status": "completed", "conclusion": "cancelled"}), BuildState::Failed)]
    #[case(json!({"run_id": 1, "status": "in_progress", "conclusion": null}), BuildState::Running)]
    #[case(json!({"run_id": 1, "status": "queued"}), BuildState::Running)]
    fn maps_job_state(#[case] body: serde_json::Value, #[case] expected: BuildState) {
        let job: ApiJob = serde_json::from_value(body).expect("job should deserialise");

        assert_eq!(job.build_state(), expected);
    }
}
