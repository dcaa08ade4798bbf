//! CircleCI provider: triggers dig builds, polls them, and downloads the
//! definitions they publish as build artifacts.
//!
//! Builds are started through the v1.1 project API with the dig job's build
//! parameters, polled through the v2 job API, and their artifacts are read
//! from the v1.1 artifact listing. Every request carries the `Circle-Token`
//! header.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactName;
use crate::ci::{ArtifactEntry, ArtifactGateway, BuildGateway, BuildId, BuildState, DigRequest};
use crate::error::DigError;

/// Public CircleCI API root.
pub const DEFAULT_CIRCLECI_BASE: &str = "https://circleci.com/api";
/// Branch the dig job is started on.
pub const DEFAULT_CIRCLECI_BRANCH: &str = "master";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DIG_JOB: &str = "dig";

/// Connection settings for [`CircleCiGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleCiConfig {
    /// API root such as `https://circleci.com/api`.
    pub base_url: String,
    /// Project slug such as `electron/electron`.
    pub project: String,
    /// Branch the dig job runs on.
    pub branch: String,
    /// API token sent as `Circle-Token`.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CircleCiConfig {
    /// Builds a configuration against the public API with default branch and
    /// timeout.
    #[must_use]
    pub fn new(project: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_CIRCLECI_BASE.to_owned(),
            project: project.into(),
            branch: DEFAULT_CIRCLECI_BRANCH.to_owned(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Overrides the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the branch the dig job runs on.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

/// CircleCI gateway implementing both provider traits.
#[derive(Debug, Clone)]
pub struct CircleCiGateway {
    client: Client,
    config: CircleCiConfig,
}

impl CircleCiGateway {
    /// Creates a gateway with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `DigError::MissingToken` when the token is blank and
    /// `DigError::Configuration` when the HTTP client cannot be built.
    pub fn new(config: CircleCiConfig) -> Result<Self, DigError> {
        if config.token.trim().is_empty() {
            return Err(DigError::MissingToken);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| DigError::Configuration {
                message: format!("failed to configure CircleCI HTTP client: {error}"),
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, version: &str, tail: &str) -> String {
        format!(
            "{}/{version}/{tail}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Circle-Token", self.config.token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, DigError> {
        let response = self
            .authorised(request)
            .send()
            .await
            .map_err(|error| DigError::Network {
                message: format!("{operation} transport failed: {error}"),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_or_else(
            |_| "(failed to read error response body)".to_owned(),
            |content| truncate_for_message(&content, 160),
        );
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(DigError::Authentication {
                message: format!("{operation} rejected with status {status}: {body}"),
            });
        }
        Err(DigError::Api {
            status: Some(status.as_u16()),
            message: format!("{operation} failed with status {status}: {body}"),
        })
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, DigError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|error| DigError::Api {
                status: None,
                message: format!("{operation} response decoding failed: {error}"),
            })
    }

    async fn download_text(&self, url: &str) -> Result<String, DigError> {
        self.send("artifact download", self.client.get(url))
            .await?
            .text()
            .await
            .map_err(|error| DigError::Network {
                message: format!("artifact download body failed: {error}"),
            })
    }
}

#[async_trait]
impl BuildGateway for CircleCiGateway {
    async fn trigger_dig(&self, request: &DigRequest) -> Result<BuildId, DigError> {
        let url = self.endpoint(
            "v1.1",
            &format!(
                "project/github/{}/tree/{}",
                self.config.project, self.config.branch
            ),
        );
        let body = TriggerBody {
            build_parameters: BuildParameters {
                dig_spot: &request.dig_spot,
                circle_job: DIG_JOB,
                base_branch: &request.base_branch,
                additional_remote: request.additional_remote.as_deref(),
            },
        };

        let triggered: TriggerResponse = self
            .send_json("trigger dig build", self.client.post(url).json(&body))
            .await?;
        let build = triggered.build_number().ok_or_else(|| DigError::Api {
            status: None,
            message: "trigger dig build response carried no build number".to_owned(),
        })?;

        info!(%build, dig_spot = %request.dig_spot, "triggered dig build");
        Ok(build)
    }

    async fn build_state(&self, build: BuildId) -> Result<BuildState, DigError> {
        let url = self.endpoint(
            "v2",
            &format!("project/gh/{}/job/{build}", self.config.project),
        );
        let job: JobResponse = self.send_json("dig job status", self.client.get(url)).await?;
        debug!(%build, status = %job.status, "polled dig job");
        Ok(job.build_state())
    }
}

#[async_trait]
impl ArtifactGateway for CircleCiGateway {
    async fn list_artifacts(&self, build: BuildId) -> Result<Vec<ArtifactEntry>, DigError> {
        let url = self.endpoint(
            "v1.1",
            &format!("project/github/{}/{build}/artifacts", self.config.project),
        );
        let listing: Vec<ApiArtifact> = self
            .send_json("dig build artifacts", self.client.get(url))
            .await?;

        Ok(listing
            .into_iter()
            .zip(0_u64..)
            .map(|(artifact, index)| ArtifactEntry {
                id: index,
                name: artifact.path,
                url: Some(artifact.url),
            })
            .collect())
    }

    async fn materialise(&self, listing: &[ArtifactEntry], dir: &Path) -> Result<(), DigError> {
        for name in ArtifactName::ALL {
            let file_name = name.file_name();
            let Some((entry, url)) = listing.iter().find_map(|entry| {
                let url = entry.url.as_deref()?;
                entry.name.ends_with(file_name).then_some((entry, url))
            }) else {
                continue;
            };

            let content = match self.download_text(url).await {
                Ok(content) => content,
                Err(error) => {
                    warn!(artifact = %entry.name, %error, "failed to download artifact");
                    continue;
                }
            };
            tokio::fs::write(dir.join(file_name), content)
                .await
                .map_err(|error| DigError::io("write artifact", &error))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
    build_parameters: BuildParameters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct BuildParameters<'a> {
    dig_spot: &'a str,
    circle_job: &'static str,
    base_branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_remote: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    build_num: Option<u64>,
    build_url: Option<String>,
}

impl TriggerResponse {
    fn build_number(&self) -> Option<BuildId> {
        self.build_num
            .or_else(|| {
                self.build_url
                    .as_deref()?
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()?
                    .parse()
                    .ok()
            })
            .map(BuildId::new)
    }
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    status: String,
}

impl JobResponse {
    fn build_state(&self) -> BuildState {
        match self.status.as_str() {
            "success" => BuildState::Passed,
            "failed" | "infrastructure_fail" | "timedout" | "canceled" | "unauthorized"
            | "terminated-unknown" => BuildState::Failed,
            _ => BuildState::Running,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiArtifact {
    path: String,
    url: String,
}

fn truncate_for_message(value: &str, max_chars: usize) -> String {
    let mut truncated: String = value.chars().take(max_chars).collect();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
