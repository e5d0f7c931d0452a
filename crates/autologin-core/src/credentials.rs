use crate::config::Configuration;
use crate::prompt::Prompter;
use crate::{Error, Result};
use std::fmt;

/// Username and password for a single login attempt. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Applies the saved-credential policy recorded in the configuration
pub struct CredentialResolver<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Return the stored credentials when the user chose to save them,
    /// otherwise prompt for both values.
    ///
    /// A saved block with a missing field is an error. Falling back to a
    /// prompt would silently override the choice made at creation time.
    pub fn resolve(&self, config: &Configuration) -> Result<Credentials> {
        let saved = &config.credentials;

        if saved.save {
            tracing::debug!("Using credentials stored in configuration");
            let username = saved
                .username
                .clone()
                .ok_or(Error::IncompleteCredentials("username"))?;
            let password = saved
                .password
                .clone()
                .ok_or(Error::IncompleteCredentials("password"))?;
            return Ok(Credentials { username, password });
        }

        tracing::debug!("Credentials not saved, prompting");
        let username = self.prompter.input("Enter username")?.trim().to_string();
        let password = self.prompter.password("Enter password")?;

        Ok(Credentials { username, password })
    }
}
