//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use octocrab::Octocrab;

use crate::error::DigError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the given token and API base URL.
///
/// The client is cheap to clone; one instance is shared by every gateway in
/// the process.
///
/// # Errors
///
/// Returns `DigError::InvalidUrl` when the base URI cannot be parsed or
/// `DigError::Api` when Octocrab fails to construct a client.
pub fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, DigError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| DigError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| DigError::Api {
            status: None,
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
