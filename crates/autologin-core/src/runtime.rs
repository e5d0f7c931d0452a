//! Where the browser runtime and the configuration file live.
//!
//! A bundle produced by `autologin package` ships the browser next to the
//! executable in [`BUNDLED_RUNTIME_DIR`]. Its presence is what marks a
//! bundled run; the configuration then lives beside the executable so it
//! survives across runs of the same installation.

use crate::config::CONFIG_FILE_NAME;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory name of the browser runtime inside a bundle
pub const BUNDLED_RUNTIME_DIR: &str = "browser-runtime";

/// Environment variable overriding the browser runtime directory
pub const BROWSERS_PATH_ENV: &str = "AUTOLOGIN_BROWSERS_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Running from a packaged bundle
    Bundled,
    /// Running from a source checkout or a plain build
    Development,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Bundled => "bundled",
            RunMode::Development => "development",
        }
    }
}

/// Resolved paths for one run. Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    mode: RunMode,
    browser_runtime_dir: Option<PathBuf>,
    config_path: PathBuf,
}

impl RuntimeEnvironment {
    /// Detect the environment of the running executable.
    ///
    /// `browsers_override` is only honoured in development mode; a bundle
    /// always uses the runtime shipped with it.
    pub fn detect(browsers_override: Option<PathBuf>) -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| Error::Environment(e.to_string()))?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| Error::Environment(format!("{} has no parent directory", exe.display())))?;

        // Set by cargo for `cargo run`, standing in for the source directory
        let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR").map(PathBuf::from);

        Ok(Self::from_parts(exe_dir, manifest_dir.as_deref(), browsers_override))
    }

    /// Build the environment from explicit locations
    pub fn from_parts(
        exe_dir: &Path,
        manifest_dir: Option<&Path>,
        browsers_override: Option<PathBuf>,
    ) -> Self {
        let bundled_runtime = exe_dir.join(BUNDLED_RUNTIME_DIR);

        if bundled_runtime.is_dir() {
            if browsers_override.is_some() {
                tracing::debug!("Ignoring browser runtime override in bundled mode");
            }
            return Self {
                mode: RunMode::Bundled,
                browser_runtime_dir: Some(bundled_runtime),
                config_path: exe_dir.join(CONFIG_FILE_NAME),
            };
        }

        let config_dir = manifest_dir.unwrap_or(exe_dir);
        Self {
            mode: RunMode::Development,
            browser_runtime_dir: browsers_override,
            config_path: config_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Use an explicit configuration file instead of the resolved default
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = path;
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn browser_runtime_dir(&self) -> Option<&Path> {
        self.browser_runtime_dir.as_deref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Fail fast when a browser runtime directory is configured but absent
    pub fn ensure_browser_runtime(&self) -> Result<()> {
        match &self.browser_runtime_dir {
            Some(dir) if !dir.is_dir() => Err(Error::BrowserRuntimeMissing(dir.clone())),
            _ => Ok(()),
        }
    }
}
