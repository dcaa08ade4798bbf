//! Repository identity wrappers and API path construction.

use url::Url;

use crate::error::DigError;

/// Public GitHub API base used when no override is configured.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, DigError> {
        if value.is_empty() {
            return Err(DigError::InvalidUrl(
                "repository owner must not be empty".to_owned(),
            ));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, DigError> {
        if value.is_empty() {
            return Err(DigError::InvalidUrl(
                "repository name must not be empty".to_owned(),
            ));
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `DigError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, DigError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DigError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Repository that check runs and workflow artifacts belong to.
///
/// # Example
///
/// ```
/// use archaeologist::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::from_full_name("electron/electron", "https://api.github.com")
///     .expect("should parse full name");
/// assert_eq!(locator.owner().as_str(), "electron");
/// assert_eq!(locator.check_runs_path(), "/repos/electron/electron/check-runs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a locator from owner and repository name strings.
    ///
    /// # Errors
    ///
    /// Returns `DigError::InvalidUrl` when either segment is empty or the API
    /// base cannot be parsed.
    pub fn from_owner_repo(owner: &str, repo: &str, api_base: &str) -> Result<Self, DigError> {
        let validated_owner = RepositoryOwner::new(owner)?;
        let repository = RepositoryName::new(repo)?;
        let parsed_base =
            Url::parse(api_base).map_err(|error| DigError::InvalidUrl(error.to_string()))?;

        Ok(Self {
            api_base: parsed_base,
            owner: validated_owner,
            repository,
        })
    }

    /// Creates a locator from a webhook `full_name` such as
    /// `electron/electron`.
    ///
    /// # Errors
    ///
    /// Returns `DigError::InvalidUrl` when the name is not `owner/repo`.
    pub fn from_full_name(full_name: &str, api_base: &str) -> Result<Self, DigError> {
        let (owner, repo) = full_name
            .split_once('/')
            .ok_or_else(|| DigError::InvalidUrl(format!("not an owner/repo name: {full_name}")))?;
        if repo.contains('/') {
            return Err(DigError::InvalidUrl(format!(
                "not an owner/repo name: {full_name}"
            )));
        }
        Self::from_owner_repo(owner, repo, api_base)
    }

    /// API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    fn repo_path(&self) -> String {
        format!(
            "/repos/{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    /// API path for creating check runs.
    #[must_use]
    pub fn check_runs_path(&self) -> String {
        format!("{}/check-runs", self.repo_path())
    }

    /// API path for updating a single check run.
    #[must_use]
    pub fn check_run_path(&self, check_run_id: u64) -> String {
        format!("{}/check-runs/{check_run_id}", self.repo_path())
    }

    /// API path for a workflow job.
    #[must_use]
    pub fn job_path(&self, job_id: u64) -> String {
        format!("{}/actions/jobs/{job_id}", self.repo_path())
    }

    /// API path listing the artifacts of a workflow run.
    #[must_use]
    pub fn run_artifacts_path(&self, run_id: u64) -> String {
        format!("{}/actions/runs/{run_id}/artifacts", self.repo_path())
    }
}
