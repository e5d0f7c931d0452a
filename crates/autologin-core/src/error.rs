use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file '{path}' is corrupted or not valid JSON: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write configuration file '{path}': {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Credentials marked as saved but {0} is missing from the configuration")]
    IncompleteCredentials(&'static str),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Interrupted by user")]
    Interrupted,

    #[error("Browser runtime directory not found: {0}")]
    BrowserRuntimeMissing(PathBuf),

    #[error("Could not determine runtime environment: {0}")]
    Environment(String),
}

pub type Result<T> = std::result::Result<T, Error>;
