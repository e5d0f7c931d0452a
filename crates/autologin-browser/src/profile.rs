use crate::Result;
use std::path::Path;
use tempfile::TempDir;

/// Throw-away browser profile directory for a single login attempt.
///
/// Nothing from earlier runs is visible to the browser, and the directory
/// is removed when the profile is dropped.
pub struct IsolatedProfile {
    dir: TempDir,
}

impl IsolatedProfile {
    pub fn create() -> Result<Self> {
        Self::create_in(None)
    }

    /// Create the profile under `parent`, or the system temp dir when `None`
    pub fn create_in(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("autologin-profile-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        tracing::debug!("Created isolated profile at {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Get the profile directory path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
