//! Persisted login configuration.
//!
//! The file is created once through an interactive dialog and only read
//! afterwards. Writes go through a temporary file in the destination
//! directory that is renamed over the target, so an interrupted dialog or a
//! failed write never leaves a half-written configuration behind.

use crate::prompt::Prompter;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default configuration file name, placed next to the executable
pub const CONFIG_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub url: String,
    pub selectors: Selectors,
    #[serde(default)]
    pub credentials: SavedCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub username_field: String,
    pub password_field: String,
    pub login_button: String,
    /// Text or selector fragment expected in the page after a successful login
    #[serde(alias = "login_successfull")]
    pub login_successful: String,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCredentials {
    #[serde(default)]
    pub save: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for SavedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedCredentials")
            .field("save", &self.save)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl Configuration {
    /// Check the fields that can be verified without a browser.
    ///
    /// Selectors are only checked at runtime by the driver.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig("url is empty".to_string()));
        }

        url::Url::parse(&self.url).map_err(|e| {
            Error::InvalidConfig(format!("url '{}' is not an absolute URL: {}", self.url, e))
        })?;

        if self.selectors.login_successful.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "login success indicator is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Copy of the configuration with the stored password replaced by a mask
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.credentials.password.is_some() {
            copy.credentials.password = Some("********".to_string());
        }
        copy
    }
}

/// Owns the configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the configuration, running the creation dialog first when the
    /// file does not exist yet
    pub fn load_or_create(&self, prompter: &dyn Prompter) -> Result<Configuration> {
        if !self.exists() {
            let name = self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
            prompter.notify(&format!(
                "Configuration file '{}' not found. Creating a new one...",
                name
            ));
            return self.create(prompter);
        }

        self.load()
    }

    /// Read, parse and validate an existing configuration file
    pub fn load(&self) -> Result<Configuration> {
        tracing::debug!("Reading configuration from: {}", self.path.display());

        let content = fs::read_to_string(&self.path).map_err(|source| Error::ConfigRead {
            path: self.path.clone(),
            source,
        })?;

        let config: Configuration =
            serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                path: self.path.clone(),
                source,
            })?;

        config.validate()?;

        tracing::info!("Loaded configuration for {}", config.url);
        Ok(config)
    }

    /// Collect a configuration interactively and persist it
    pub fn create(&self, prompter: &dyn Prompter) -> Result<Configuration> {
        let config = prompt_configuration(prompter)?;
        self.save(&config)?;
        prompter.notify(&format!("Configuration saved to '{}'.", self.path.display()));
        Ok(config)
    }

    /// Atomically replace the configuration file with `config`
    pub fn save(&self, config: &Configuration) -> Result<()> {
        let write_error = |source: std::io::Error| Error::ConfigWrite {
            path: self.path.clone(),
            source,
        };

        let json = to_json(config).map_err(|e| write_error(std::io::Error::other(e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // NamedTempFile is created with 0600, which persist keeps
        let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
        file.write_all(json.as_bytes()).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path).map_err(|e| write_error(e.error))?;

        tracing::info!("Wrote configuration to {}", self.path.display());
        Ok(())
    }
}

/// Serialize a configuration the way it is stored on disk
pub fn to_json(config: &Configuration) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config.serialize(&mut serializer)?;
    buf.push(b'\n');

    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run the creation dialog: URL, three selectors, success indicator, then
/// the plaintext-storage decision and, only if accepted, the credentials.
pub fn prompt_configuration(prompter: &dyn Prompter) -> Result<Configuration> {
    prompter.notify("Please provide the following details to create your configuration:");

    let url = loop {
        let url = prompter.input("Enter URL")?.trim().to_string();
        match url::Url::parse(&url) {
            Ok(_) => break url,
            Err(e) => prompter.notify(&format!(
                "'{}' is not an absolute URL ({}). Include the scheme, e.g. https://example.com/login",
                url, e
            )),
        }
    };

    let username_field = prompter.input("Enter username field CSS selector")?.trim().to_string();
    let password_field = prompter.input("Enter password field CSS selector")?.trim().to_string();
    let login_button = prompter.input("Enter login button CSS selector")?.trim().to_string();

    let login_successful = loop {
        let indicator = prompter
            .input("Enter login success confirmation selector or text")?
            .trim()
            .to_string();
        if !indicator.is_empty() {
            break indicator;
        }
        prompter.notify("The success indicator cannot be empty.");
    };

    let save = prompter.confirm("Save username and password in plain text inside the configuration file?")?;

    let credentials = if save {
        let username = prompter.input("Enter username")?.trim().to_string();
        let password = prompter.password("Enter password")?;
        SavedCredentials {
            save,
            username: Some(username),
            password: Some(password),
        }
    } else {
        SavedCredentials::default()
    };

    Ok(Configuration {
        url,
        selectors: Selectors {
            username_field,
            password_field,
            login_button,
            login_successful,
        },
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn dialog_answers(save: &str) -> Vec<&str> {
        vec![
            "https://example.com/login",
            "#user",
            "#pass",
            "#submit",
            "dashboard",
            save,
        ]
    }

    #[test]
    fn test_create_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(CONFIG_FILE_NAME));

        let mut answers = dialog_answers("y");
        answers.extend(["alice", "s3cret"]);
        let prompter = ScriptedPrompter::new(answers);

        let created = store.load_or_create(&prompter).unwrap();
        assert_eq!(prompter.remaining(), 0);

        let loaded = store.load().unwrap();
        assert_eq!(created, loaded);
        assert_eq!(loaded.url, "https://example.com/login");
        assert_eq!(loaded.selectors.username_field, "#user");
        assert_eq!(loaded.selectors.password_field, "#pass");
        assert_eq!(loaded.selectors.login_button, "#submit");
        assert_eq!(loaded.selectors.login_successful, "dashboard");
        assert!(loaded.credentials.save);
        assert_eq!(loaded.credentials.username.as_deref(), Some("alice"));
        assert_eq!(loaded.credentials.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_declining_to_save_omits_credential_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let store = ConfigStore::new(&path);

        let prompter = ScriptedPrompter::new(dialog_answers("n"));
        let config = store.load_or_create(&prompter).unwrap();
        assert!(!config.credentials.save);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let credentials = raw["credentials"].as_object().unwrap();
        assert_eq!(credentials.get("save"), Some(&serde_json::Value::Bool(false)));
        assert!(!credentials.contains_key("username"));
        assert!(!credentials.contains_key("password"));
    }

    #[test]
    fn test_dialog_asks_in_order_and_only_asks_credentials_when_saving() {
        let prompter = ScriptedPrompter::new(dialog_answers("no"));
        prompt_configuration(&prompter).unwrap();

        let asked = prompter.asked();
        assert_eq!(asked.len(), 6);
        assert_eq!(asked[0], "Enter URL");
        assert!(asked[5].starts_with("Save username and password"));
    }

    #[test]
    fn test_dialog_reasks_invalid_url() {
        let mut answers = vec!["example.com/login"];
        answers.extend(dialog_answers("n"));
        let prompter = ScriptedPrompter::new(answers);

        let config = prompt_configuration(&prompter).unwrap();
        assert_eq!(config.url, "https://example.com/login");
        assert!(prompter.notices().iter().any(|n| n.contains("not an absolute URL")));
    }

    #[test]
    fn test_interrupted_dialog_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let store = ConfigStore::new(&path);

        // Answers run out at the password prompt
        let mut answers = dialog_answers("y");
        answers.push("alice");
        let prompter = ScriptedPrompter::new(answers);

        let result = store.load_or_create(&prompter);
        assert!(matches!(result, Err(Error::Interrupted)));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ \"url\": ").unwrap();

        let prompter = ScriptedPrompter::default();
        let result = ConfigStore::new(&path).load_or_create(&prompter);

        assert!(matches!(result, Err(Error::ConfigParse { .. })));
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_write_failure_is_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join(CONFIG_FILE_NAME);

        let prompter = ScriptedPrompter::new(dialog_answers("n"));
        let result = ConfigStore::new(&path).load_or_create(&prompter);

        assert!(matches!(result, Err(Error::ConfigWrite { .. })));
    }

    #[test]
    fn test_legacy_indicator_key_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r##"{
                "url": "https://example.com/login",
                "selectors": {
                    "username_field": "#user",
                    "password_field": "#pass",
                    "login_button": "#submit",
                    "login_successfull": "Welcome"
                },
                "credentials": {"save": false}
            }"##,
        )
        .unwrap();

        let config = ConfigStore::new(&path).load().unwrap();
        assert_eq!(config.selectors.login_successful, "Welcome");
    }

    #[test]
    fn test_relative_url_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r##"{
                "url": "/login",
                "selectors": {
                    "username_field": "#user",
                    "password_field": "#pass",
                    "login_button": "#submit",
                    "login_successful": "dashboard"
                }
            }"##,
        )
        .unwrap();

        let result = ConfigStore::new(&path).load();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_blank_success_indicator_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r##"{
                "url": "https://example.com/login",
                "selectors": {
                    "username_field": "#user",
                    "password_field": "#pass",
                    "login_button": "#submit",
                    "login_successful": "   "
                }
            }"##,
        )
        .unwrap();

        let err = ConfigStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("indicator is empty"));
    }

    #[test]
    fn test_json_layout_is_stable_and_indented() {
        let prompter = ScriptedPrompter::new(dialog_answers("n"));
        let config = prompt_configuration(&prompter).unwrap();

        let json = to_json(&config).unwrap();
        let url_pos = json.find("\"url\"").unwrap();
        let selectors_pos = json.find("\"selectors\"").unwrap();
        let credentials_pos = json.find("\"credentials\"").unwrap();

        assert!(url_pos < selectors_pos && selectors_pos < credentials_pos);
        assert!(json.contains("\n    \"url\": \"https://example.com/login\""));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn test_redacted_masks_password_and_debug_hides_it() {
        let config = Configuration {
            url: "https://example.com".to_string(),
            selectors: Selectors {
                username_field: "#u".to_string(),
                password_field: "#p".to_string(),
                login_button: "#b".to_string(),
                login_successful: "ok".to_string(),
            },
            credentials: SavedCredentials {
                save: true,
                username: Some("alice".to_string()),
                password: Some("hunter2".to_string()),
            },
        };

        assert_eq!(config.redacted().credentials.password.as_deref(), Some("********"));
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
