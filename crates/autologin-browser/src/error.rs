use chromiumoxide::error::CdpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Browser not found: {0}")]
    BrowserNotFound(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Timed out {0}")]
    Timeout(String),

    #[error("Automation error: {0}")]
    Automation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CdpError> for Error {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::Timeout => Error::Timeout("waiting for the browser to respond".to_string()),
            other => Error::Automation(other.to_string()),
        }
    }
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
