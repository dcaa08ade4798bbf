//! Unified diff rendering through libgit2.

use std::path::Path;

use git2::{DiffOptions, Patch};

use crate::artifacts::ArtifactName;
use crate::error::DigError;

/// Renders a unified diff from `old` to `new`.
///
/// The `diff --git`/`index` preamble is dropped; the patch starts at the
/// `---`/`+++` file lines. Identical inputs produce an empty string.
///
/// # Errors
///
/// Returns [`DigError::Io`] when libgit2 fails to build or print the patch.
pub fn render_diff(old: &str, new: &str) -> Result<String, DigError> {
    let mut options = DiffOptions::new();
    options.context_lines(3);

    let mut patch = Patch::from_buffers(
        old.as_bytes(),
        Some(Path::new(ArtifactName::OldDefinitions.file_name())),
        new.as_bytes(),
        Some(Path::new(ArtifactName::NewDefinitions.file_name())),
        Some(&mut options),
    )
    .map_err(|error| DigError::Io {
        message: format!("build patch: {error}"),
    })?;

    let buffer = patch.to_buf().map_err(|error| DigError::Io {
        message: format!("print patch: {error}"),
    })?;

    Ok(strip_preamble(&String::from_utf8_lossy(&buffer)))
}

fn strip_preamble(patch: &str) -> String {
    let mut offset = 0;
    for line in patch.split_inclusive('\n') {
        if line.starts_with("--- ") || line.starts_with("@@") {
            break;
        }
        offset += line.len();
    }
    patch
        .get(offset..)
        .unwrap_or_default()
        .trim_end_matches('\n')
        .to_owned()
}
