//! Semver label policy for `electron.d.ts` changes.
//!
//! A pull request that changes the public API surface must declare its
//! impact with a `semver/patch`, `semver/minor`, or `semver/major` label. A
//! pull request that does not change it must carry `semver/none` or no
//! semver label at all. Mismatches in either direction fail the check.

use std::fmt;

use crate::github::CheckConclusion;

/// Prefix shared by every semver label.
pub const SEMVER_PREFIX: &str = "semver/";

/// Declared semantic-versioning impact of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemverLabel {
    /// `semver/none`
    None,
    /// `semver/patch`
    Patch,
    /// `semver/minor`
    Minor,
    /// `semver/major`
    Major,
}

impl SemverLabel {
    /// Parses a full label name such as `semver/minor`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.strip_prefix(SEMVER_PREFIX)? {
            "none" => Some(Self::None),
            "patch" => Some(Self::Patch),
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            _ => None,
        }
    }

    /// Resolves the declared label from a pull request's labels.
    ///
    /// The first label carrying the `semver/` prefix wins, in the order the
    /// labels are given; an unknown suffix on that label counts as no
    /// recognised label.
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .find(|label| label.as_ref().starts_with(SEMVER_PREFIX))
            .and_then(|label| Self::parse(label.as_ref()))
    }

    /// Whether the label declares an API impact.
    #[must_use]
    pub const fn declares_impact(self) -> bool {
        matches!(self, Self::Patch | Self::Minor | Self::Major)
    }
}

impl fmt::Display for SemverLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        };
        write!(formatter, "{SEMVER_PREFIX}{suffix}")
    }
}

/// One of the four fixed policy outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckStatus {
    /// Conclusion reported on the check run.
    pub conclusion: CheckConclusion,
    /// Check run title.
    pub title: &'static str,
    /// Lead-in of the check run summary; any diff is appended after it.
    pub summary: &'static str,
}

/// Changes detected and an impact label is present.
pub const VALID_CHANGES: CheckStatus = CheckStatus {
    conclusion: CheckConclusion::Neutral,
    title: "Changes Detected",
    summary: "",
};

/// Changes detected but the pull request is labelled `semver/none` or
/// carries no semver label.
pub const INVALID_CHANGES: CheckStatus = CheckStatus {
    conclusion: CheckConclusion::Failure,
    title: "Label Mismatch with Changes Detected",
    summary: "Changes detected despite the presence of 'semver/none' label. ",
};

/// No changes and no impact label.
pub const VALID_NO_CHANGES: CheckStatus = CheckStatus {
    conclusion: CheckConclusion::Success,
    title: "No Changes",
    summary: "We couldn't see any changes in the `electron.d.ts` artifact",
};

/// No changes yet an impact label is present.
pub const INVALID_NO_CHANGES: CheckStatus = CheckStatus {
    conclusion: CheckConclusion::Failure,
    title: "Label Mismatch with No Changes",
    summary: "No changes detected despite the presence of 'semver/minor' or 'semver/major' labels.",
};

/// Selects the policy outcome for a pull request.
///
/// ```
/// use archaeologist::policy::{evaluate, INVALID_CHANGES, VALID_CHANGES};
///
/// assert_eq!(evaluate(&["semver/minor"], true), VALID_CHANGES);
/// assert_eq!(evaluate::<&str>(&[], true), INVALID_CHANGES);
/// ```
#[must_use]
pub fn evaluate<S: AsRef<str>>(labels: &[S], has_changes: bool) -> CheckStatus {
    let declares_impact = SemverLabel::from_labels(labels).is_some_and(SemverLabel::declares_impact);
    match (has_changes, declares_impact) {
        (true, true) => VALID_CHANGES,
        (true, false) => INVALID_CHANGES,
        (false, false) => VALID_NO_CHANGES,
        (false, true) => INVALID_NO_CHANGES,
    }
}
