//! Retrieval of the generated definition artifacts from a CI build.
//!
//! A dig build publishes three files: the definitions generated from the
//! pull request head, the definitions generated from its base, and a
//! `.dig-old` marker naming the base commit. [`ArtifactFetcher`] collects
//! them into an [`ArtifactBundle`] that always accounts for every name,
//! either as content or as missing.

mod fetcher;
mod scratch;

pub use fetcher::ArtifactFetcher;
pub use scratch::ScratchDir;

use std::fmt;

/// The fixed artifact files produced by a dig build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactName {
    /// `electron.new.d.ts`: definitions generated from the pull request.
    NewDefinitions,
    /// `electron.old.d.ts`: definitions generated from the base branch.
    OldDefinitions,
    /// `.dig-old`: marker naming the commit the old definitions came from.
    DigSpot,
}

impl ArtifactName {
    /// All expected artifacts, in reporting order.
    pub const ALL: [Self; 3] = [Self::NewDefinitions, Self::OldDefinitions, Self::DigSpot];

    /// File name of the artifact inside the build output.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::NewDefinitions => "electron.new.d.ts",
            Self::OldDefinitions => "electron.old.d.ts",
            Self::DigSpot => ".dig-old",
        }
    }

    /// Matches a file name against the expected artifacts.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|artifact| artifact.file_name() == name)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.file_name())
    }
}

/// Result of one fetch: every expected artifact is either present or listed
/// in [`ArtifactBundle::missing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    missing: Vec<ArtifactName>,
    new_document: Option<String>,
    old_document: Option<String>,
    dig_spot: Option<String>,
}

impl ArtifactBundle {
    /// Bundle in which every artifact is missing.
    #[must_use]
    pub fn all_missing() -> Self {
        Self {
            missing: ArtifactName::ALL.to_vec(),
            new_document: None,
            old_document: None,
            dig_spot: None,
        }
    }

    /// Records the content of an artifact, removing it from the missing list.
    ///
    /// The dig spot marker is trimmed of surrounding whitespace.
    #[must_use]
    pub fn with(mut self, name: ArtifactName, content: String) -> Self {
        self.missing.retain(|missing| *missing != name);
        match name {
            ArtifactName::NewDefinitions => self.new_document = Some(content),
            ArtifactName::OldDefinitions => self.old_document = Some(content),
            ArtifactName::DigSpot => self.dig_spot = Some(content.trim().to_owned()),
        }
        self
    }

    /// Artifacts that could not be retrieved, in reporting order.
    #[must_use]
    pub fn missing(&self) -> &[ArtifactName] {
        &self.missing
    }

    /// Whether every artifact was retrieved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Definitions generated from the pull request head.
    #[must_use]
    pub fn new_document(&self) -> Option<&str> {
        self.new_document.as_deref()
    }

    /// Definitions generated from the base branch.
    #[must_use]
    pub fn old_document(&self) -> Option<&str> {
        self.old_document.as_deref()
    }

    /// Trimmed content of the `.dig-old` marker.
    #[must_use]
    pub fn dig_spot(&self) -> Option<&str> {
        self.dig_spot.as_deref()
    }

    /// Splits a complete bundle into its documents.
    ///
    /// Returns `None` when any artifact is missing or empty.
    #[must_use]
    pub fn into_documents(self) -> Option<CompleteArtifacts> {
        match (self.new_document, self.old_document, self.dig_spot) {
            (Some(new_document), Some(old_document), Some(dig_spot))
                if !new_document.is_empty() && !old_document.is_empty() && !dig_spot.is_empty() =>
            {
                Some(CompleteArtifacts {
                    new_document,
                    old_document,
                    dig_spot,
                })
            }
            _ => None,
        }
    }
}

/// The three artifacts of a fully retrieved bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteArtifacts {
    /// Definitions generated from the pull request head.
    pub new_document: String,
    /// Definitions generated from the base branch.
    pub old_document: String,
    /// Trimmed `.dig-old` marker.
    pub dig_spot: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ArtifactBundle, ArtifactName};

    #[rstest]
    #[case("electron.new.d.ts", Some(ArtifactName::NewDefinitions))]
    #[case("electron.old.d.ts", Some(ArtifactName::OldDefinitions))]
    #[case(".dig-old", Some(ArtifactName::DigSpot))]
    #[case("artifacts.zip", None)]
    #[case("electron.d.ts", None)]
    fn matches_expected_file_names(#[case] file_name: &str, #[case] expected: Option<ArtifactName>) {
        assert_eq!(ArtifactName::from_file_name(file_name), expected);
    }

    #[rstest]
    fn every_name_is_present_or_missing() {
        let bundle = ArtifactBundle::all_missing()
            .with(ArtifactName::OldDefinitions, "old".to_owned());

        for name in ArtifactName::ALL {
            let present = match name {
                ArtifactName::NewDefinitions => bundle.new_document().is_some(),
                ArtifactName::OldDefinitions => bundle.old_document().is_some(),
                ArtifactName::DigSpot => bundle.dig_spot().is_some(),
            };
            let missing = bundle.missing().contains(&name);
            assert!(present != missing, "{name} must be exactly one of present/missing");
        }
    }

    #[rstest]
    fn trims_dig_spot_marker() {
        let bundle = ArtifactBundle::all_missing()
            .with(ArtifactName::DigSpot, "  abc123\n".to_owned());

        assert_eq!(bundle.dig_spot(), Some("abc123"));
    }

    #[rstest]
    fn into_documents_requires_every_artifact() {
        let partial = ArtifactBundle::all_missing()
            .with(ArtifactName::NewDefinitions, "new".to_owned())
            .with(ArtifactName::OldDefinitions, "old".to_owned());
        assert!(partial.clone().into_documents().is_none());

        let complete = partial
            .with(ArtifactName::DigSpot, "sha".to_owned())
            .into_documents()
            .expect("bundle should be complete");
        assert_eq!(complete.new_document, "new");
        assert_eq!(complete.old_document, "old");
        assert_eq!(complete.dig_spot, "sha");
    }

    #[rstest]
    #[case::empty_new_definitions("", "old", "sha")]
    #[case::empty_old_definitions("new", "", "sha")]
    #[case::blank_dig_spot("new", "old", " \n")]
    fn into_documents_rejects_empty_artifacts(
        #[case] new_document: &str,
        #[case] old_document: &str,
        #[case] dig_spot: &str,
    ) {
        let bundle = ArtifactBundle::all_missing()
            .with(ArtifactName::NewDefinitions, new_document.to_owned())
            .with(ArtifactName::OldDefinitions, old_document.to_owned())
            .with(ArtifactName::DigSpot, dig_spot.to_owned());

        assert!(bundle.is_complete());
        assert!(bundle.into_documents().is_none());
    }
}
