mod chrome_finder;
mod driver;
mod error;
mod profile;

pub use chrome_finder::ChromeFinder;
pub use driver::{DEFAULT_TIMEOUT, LoginDriver, LoginOptions, LoginStep, SETTLE_INTERVAL};
pub use error::{Error, Result};
pub use profile::IsolatedProfile;
