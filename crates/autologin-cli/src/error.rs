use thiserror::Error;

/// Why a run ended early. Each kind maps to one process exit status.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{0}")]
    Config(autologin_core::Error),

    #[error("{0}")]
    Credentials(autologin_core::Error),

    #[error("{0}")]
    Prompt(autologin_core::Error),

    #[error("{0}")]
    BrowserUnavailable(String),

    #[error("Timeout while waiting for page elements or navigation: {0}")]
    Timeout(autologin_browser::Error),

    #[error("Unexpected error occurred during browser automation: {0}")]
    Automation(autologin_browser::Error),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("{0}")]
    Internal(String),
}

impl RunError {
    /// Process exit status for this kind of failure
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Interrupted => 0,
            RunError::Config(_) => 2,
            RunError::Credentials(_) => 3,
            RunError::BrowserUnavailable(_) => 4,
            RunError::Timeout(_) => 5,
            RunError::Automation(_) => 6,
            RunError::Prompt(_) | RunError::Internal(_) => 1,
        }
    }
}

impl From<autologin_core::Error> for RunError {
    fn from(err: autologin_core::Error) -> Self {
        use autologin_core::Error;

        match err {
            Error::Interrupted => RunError::Interrupted,
            Error::IncompleteCredentials(_) => RunError::Credentials(err),
            Error::BrowserRuntimeMissing(_) => RunError::BrowserUnavailable(err.to_string()),
            Error::Prompt(_) => RunError::Prompt(err),
            Error::Environment(_) => RunError::Internal(err.to_string()),
            Error::ConfigRead { .. }
            | Error::ConfigParse { .. }
            | Error::ConfigWrite { .. }
            | Error::InvalidConfig(_) => RunError::Config(err),
        }
    }
}

impl From<autologin_browser::Error> for RunError {
    fn from(err: autologin_browser::Error) -> Self {
        use autologin_browser::Error;

        match err {
            Error::Timeout(_) => RunError::Timeout(err),
            Error::BrowserNotFound(_) | Error::Launch(_) => {
                RunError::BrowserUnavailable(err.to_string())
            }
            Error::Automation(_) | Error::Io(_) => RunError::Automation(err),
        }
    }
}
