//! Webhook payload decoding and routing to orchestration triggers.

use serde::Deserialize;

use crate::ci::BuildId;
use crate::error::DigError;
use crate::orchestrator::{CheckCompletedTrigger, PullRequestTrigger, Trigger};

const PULL_REQUEST_ACTIONS: [&str; 3] = ["opened", "reopened", "synchronize"];

/// A trigger together with the repository it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    /// `owner/repo` of the repository that sent the delivery.
    pub repository: String,
    /// Trigger to orchestrate.
    pub trigger: Trigger,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: String,
    pull_request: PullRequestPayload,
    repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    html_url: Option<String>,
    head: RefPayload,
    base: RefPayload,
    #[serde(default)]
    labels: Vec<LabelPayload>,
}

#[derive(Debug, Deserialize)]
struct RefPayload {
    sha: String,
    #[serde(rename = "ref")]
    branch: String,
    repo: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    full_name: String,
    clone_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CheckRunEvent {
    action: String,
    check_run: CheckRunPayload,
    repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
struct CheckRunPayload {
    id: u64,
    name: String,
    head_sha: String,
    html_url: Option<String>,
    url: Option<String>,
}

/// Maps a webhook delivery to a trigger.
///
/// `event` is the `X-GitHub-Event` header value. Deliveries that do not
/// start a run (other events, other actions, check runs with a different
/// name) yield `Ok(None)`.
///
/// # Errors
///
/// Returns `DigError::InvalidPayload` when a `pull_request` or `check_run`
/// body cannot be decoded.
pub fn route_event(
    event: &str,
    body: &[u8],
    check_name: &str,
) -> Result<Option<RoutedEvent>, DigError> {
    match event {
        "pull_request" => decode::<PullRequestEvent>(body).map(route_pull_request),
        "check_run" => {
            decode::<CheckRunEvent>(body).map(|payload| route_check_run(payload, check_name))
        }
        _ => Ok(None),
    }
}

fn decode<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Result<T, DigError> {
    serde_json::from_slice(body).map_err(|error| DigError::InvalidPayload {
        message: error.to_string(),
    })
}

fn route_pull_request(event: PullRequestEvent) -> Option<RoutedEvent> {
    if !PULL_REQUEST_ACTIONS.contains(&event.action.as_str()) {
        return None;
    }
    let PullRequestPayload {
        html_url,
        head,
        base,
        labels,
    } = event.pull_request;

    let base_name = base
        .repo
        .as_ref()
        .map_or(event.repository.full_name.as_str(), |repo| {
            repo.full_name.as_str()
        });
    let fork_remote = head
        .repo
        .as_ref()
        .filter(|repo| repo.full_name != base_name)
        .and_then(|repo| repo.clone_url.clone());

    Some(RoutedEvent {
        repository: event.repository.full_name.clone(),
        trigger: Trigger::PullRequest(PullRequestTrigger {
            head_sha: head.sha,
            base_branch: base.branch,
            fork_remote,
            details_url: html_url,
            labels: labels.into_iter().map(|label| label.name).collect(),
        }),
    })
}

fn route_check_run(event: CheckRunEvent, check_name: &str) -> Option<RoutedEvent> {
    if event.action != "completed" || event.check_run.name != check_name {
        return None;
    }
    let CheckRunPayload {
        id,
        head_sha,
        html_url,
        url,
        ..
    } = event.check_run;

    Some(RoutedEvent {
        repository: event.repository.full_name,
        trigger: Trigger::CheckCompleted(CheckCompletedTrigger {
            head_sha,
            details_url: html_url.or(url),
            build_or_run_id: BuildId::new(id),
        }),
    })
}
