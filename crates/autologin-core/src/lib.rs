pub mod config;
pub mod credentials;
pub mod error;
pub mod outcome;
pub mod prompt;
pub mod runtime;

pub use config::{CONFIG_FILE_NAME, ConfigStore, Configuration, SavedCredentials, Selectors};
pub use credentials::{CredentialResolver, Credentials};
pub use error::{Error, Result};
pub use outcome::{Outcome, classify};
pub use prompt::{Prompter, ScriptedPrompter};
pub use runtime::{BROWSERS_PATH_ENV, BUNDLED_RUNTIME_DIR, RunMode, RuntimeEnvironment};
