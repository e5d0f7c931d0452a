pub mod commands;
pub mod error;
pub mod terminal;

pub use error::RunError;
pub use terminal::TerminalPrompter;
