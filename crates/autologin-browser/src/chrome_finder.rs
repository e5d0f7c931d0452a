use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// File names of Chromium builds that can drive a headless login
const EXECUTABLE_NAMES: &[&str] = &[
    "chrome-headless-shell",
    "headless_shell",
    "chrome",
    "chromium",
    "Google Chrome for Testing",
    "Chromium",
    "chrome-headless-shell.exe",
    "chrome.exe",
];

/// Names looked up on `PATH` when nothing else is configured
const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// How deep to descend into a browser runtime directory
const MAX_SEARCH_DEPTH: usize = 6;

/// Locates the browser binary for a run
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
    runtime_dir: Option<PathBuf>,
}

impl ChromeFinder {
    /// Create a finder with an optional explicit binary and an optional
    /// browser runtime directory to search
    pub fn new(custom_path: Option<PathBuf>, runtime_dir: Option<PathBuf>) -> Self {
        Self {
            custom_path,
            runtime_dir,
        }
    }

    /// Find the browser: explicit path, then the runtime directory, then
    /// platform defaults and `PATH`
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return Self::validate_chrome_path(path);
        }

        if let Some(ref dir) = self.runtime_dir {
            return Self::search_runtime_dir(dir);
        }

        for path in Self::default_paths() {
            if let Ok(valid_path) = Self::validate_chrome_path(&path) {
                return Ok(valid_path);
            }
        }

        for name in PATH_NAMES {
            if let Ok(path) = which::which(name) {
                tracing::debug!("Found {} on PATH at {}", name, path.display());
                return Ok(path);
            }
        }

        Err(Error::BrowserNotFound(format!(
            "Chrome not found. Checked: {} and PATH. Use --chrome-path or --browser-path to specify location.",
            Self::default_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    /// Search a browser runtime directory for a known executable
    fn search_runtime_dir(dir: &Path) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(Error::BrowserNotFound(format!(
                "browser runtime directory not found at: {}",
                dir.display()
            )));
        }

        let mut pending = vec![(dir.to_path_buf(), 0usize)];
        while let Some((current, depth)) = pending.pop() {
            let mut subdirs = Vec::new();
            for entry in std::fs::read_dir(&current)? {
                let path = entry?.path();
                if path.is_dir() {
                    if depth < MAX_SEARCH_DEPTH {
                        subdirs.push((path, depth + 1));
                    }
                    continue;
                }

                let is_candidate = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| EXECUTABLE_NAMES.contains(&n));
                if is_candidate {
                    if let Ok(found) = Self::validate_chrome_path(&path) {
                        tracing::debug!("Found browser in runtime directory: {}", found.display());
                        return Ok(found);
                    }
                }
            }
            pending.extend(subdirs);
        }

        Err(Error::BrowserNotFound(format!(
            "no browser executable found in runtime directory: {}",
            dir.display()
        )))
    }

    /// Get platform-specific default Chrome paths
    fn default_paths() -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        return vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ];

        #[cfg(target_os = "linux")]
        return vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
        ];

        #[cfg(target_os = "windows")]
        return vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        return vec![];
    }

    /// Validate that a path exists and is executable
    fn validate_chrome_path(path: &Path) -> Result<PathBuf> {
        if !path.is_file() {
            return Err(Error::BrowserNotFound(format!(
                "Chrome not found at: {}",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)?;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(Error::BrowserNotFound(format!(
                    "Chrome binary not executable: {}",
                    path.display()
                )));
            }
        }

        Ok(path.to_path_buf())
    }
}
