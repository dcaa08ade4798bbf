//! Per-call scratch directories for artifact extraction.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::DigError;

const SCRATCH_NAMESPACE: &str = "archaeologist";
const SCRATCH_PREFIX: &str = "diffing";

/// Uniquely named temporary directory removed when dropped.
///
/// Every acquisition creates a fresh directory below
/// `<tmp>/archaeologist/`, so concurrent runs never share one.
#[derive(Debug)]
pub struct ScratchDir {
    inner: TempDir,
}

impl ScratchDir {
    /// Creates a fresh scratch directory under the process temp root.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::Io`] when the namespace or directory cannot be
    /// created.
    pub fn acquire() -> Result<Self, DigError> {
        Self::acquire_in(&std::env::temp_dir())
    }

    /// Creates a fresh scratch directory under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::Io`] when the namespace or directory cannot be
    /// created.
    pub fn acquire_in(root: &Path) -> Result<Self, DigError> {
        let namespace: PathBuf = root.join(SCRATCH_NAMESPACE);
        std::fs::create_dir_all(&namespace)
            .map_err(|error| DigError::io("create scratch namespace", &error))?;
        let inner = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&namespace)
            .map_err(|error| DigError::io("create scratch directory", &error))?;
        Ok(Self { inner })
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Removes the directory now, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns [`DigError::Io`] when removal fails.
    pub fn release(self) -> Result<(), DigError> {
        self.inner
            .close()
            .map_err(|error| DigError::io("remove scratch directory", &error))
    }
}
