//! Inspect or (re)create the configuration file outside of a login run.

use crate::commands::{prompt_blocking, run_interruptible};
use crate::{RunError, TerminalPrompter};
use anyhow::{Result, bail};
use autologin_core::config::to_json;
use autologin_core::{ConfigStore, RuntimeEnvironment};

/// Print where the configuration and browser runtime are resolved to
pub fn path(env: &RuntimeEnvironment) -> Result<()> {
    let runtime = env
        .browser_runtime_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "system default".to_string());

    println!("Configuration:   {}", env.config_path().display());
    println!("Run mode:        {}", env.mode().as_str());
    println!("Browser runtime: {}", runtime);
    Ok(())
}

/// Print the configuration with the stored password masked
pub fn show(env: &RuntimeEnvironment) -> Result<()> {
    let store = ConfigStore::new(env.config_path());
    if !store.exists() {
        bail!(
            "Configuration file '{}' not found. Run 'autologin config init' to create it.",
            store.path().display()
        );
    }

    let config = store.load()?;
    print!("{}", to_json(&config.redacted())?);
    Ok(())
}

/// Run the creation dialog explicitly
pub fn init(env: &RuntimeEnvironment, force: bool) -> Result<()> {
    let store = ConfigStore::new(env.config_path());
    if store.exists() && !force {
        bail!(
            "Configuration file '{}' already exists. Use --force to overwrite it.",
            store.path().display()
        );
    }

    let result = run_interruptible(prompt_blocking(move || {
        store.create(&TerminalPrompter::new()).map(|_| ())
    }));

    match result {
        Ok(()) => Ok(()),
        Err(RunError::Interrupted) => {
            println!();
            println!("🚪 Process interrupted by user. Configuration left unchanged.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
