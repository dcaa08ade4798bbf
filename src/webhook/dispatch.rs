//! Runs routed triggers against GitHub and the configured CI providers.

use std::sync::Arc;

use octocrab::Octocrab;
use tracing::{Instrument, error, info, info_span, warn};

use crate::ci::{ArtifactGateway, BuildGateway};
use crate::circleci::{CircleCiConfig, CircleCiGateway};
use crate::error::DigError;
use crate::github::{OctocrabActionsGateway, OctocrabCheckRunGateway, RepositoryLocator};
use crate::orchestrator::{Orchestrator, OrchestratorConfig, Trigger};

use super::{Dispatcher, RoutedEvent};

/// CircleCI settings used to build a gateway per pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleCiSettings {
    /// API token.
    pub token: String,
    /// API root.
    pub base_url: String,
    /// Branch the dig job runs on.
    pub branch: String,
    /// Project slug; the delivering repository when unset.
    pub project: Option<String>,
}

/// Dispatcher that processes each trigger on its own task.
///
/// Pull request triggers start a dig build on CircleCI; completed check runs
/// are resolved through GitHub Actions.
#[derive(Clone)]
pub struct GitHubDispatcher {
    context: Arc<DispatchContext>,
}

struct DispatchContext {
    client: Octocrab,
    api_base: String,
    orchestrator: OrchestratorConfig,
    circleci: Option<CircleCiSettings>,
}

impl GitHubDispatcher {
    /// Creates a dispatcher sharing `client` across runs.
    #[must_use]
    pub fn new(
        client: Octocrab,
        api_base: impl Into<String>,
        orchestrator: OrchestratorConfig,
        circleci: Option<CircleCiSettings>,
    ) -> Self {
        Self {
            context: Arc::new(DispatchContext {
                client,
                api_base: api_base.into(),
                orchestrator,
                circleci,
            }),
        }
    }
}

impl Dispatcher for GitHubDispatcher {
    fn dispatch(&self, event: RoutedEvent) {
        let context = Arc::clone(&self.context);
        let span = info_span!("delivery", repository = %event.repository);
        tokio::spawn(
            async move {
                if let Err(run_error) = context.process(&event).await {
                    error!(error = %run_error, "orchestration run failed");
                }
            }
            .instrument(span),
        );
    }
}

impl DispatchContext {
    async fn process(&self, event: &RoutedEvent) -> Result<(), DigError> {
        let locator = RepositoryLocator::from_full_name(&event.repository, &self.api_base)?;
        let checks = OctocrabCheckRunGateway::with_client(self.client.clone(), locator.clone());

        match &event.trigger {
            Trigger::PullRequest(_) => {
                let Some(settings) = &self.circleci else {
                    warn!("no CircleCI token configured, ignoring pull request");
                    return Ok(());
                };
                let project = settings
                    .project
                    .clone()
                    .unwrap_or_else(|| event.repository.clone());
                let provider = CircleCiGateway::new(
                    CircleCiConfig::new(project, settings.token.as_str())
                        .with_base_url(settings.base_url.as_str())
                        .with_branch(settings.branch.as_str()),
                )?;
                self.run(&checks, &provider, &event.trigger).await
            }
            Trigger::CheckCompleted(_) => {
                let provider = OctocrabActionsGateway::with_client(self.client.clone(), locator);
                self.run(&checks, &provider, &event.trigger).await
            }
        }
    }

    async fn run<P>(
        &self,
        checks: &OctocrabCheckRunGateway,
        provider: &P,
        trigger: &Trigger,
    ) -> Result<(), DigError>
    where
        P: BuildGateway + ArtifactGateway,
    {
        let outcome = Orchestrator::new(checks, provider, &self.orchestrator)
            .run(trigger)
            .await?;
        info!(
            conclusion = outcome.conclusion.as_str(),
            title = %outcome.title,
            "orchestration run concluded"
        );
        Ok(())
    }
}
