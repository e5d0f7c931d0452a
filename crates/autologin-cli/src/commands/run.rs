//! The login workflow: configuration, credentials, browser, verdict.

use crate::commands::{prompt_blocking, run_interruptible};
use crate::{RunError, TerminalPrompter};
use autologin_browser::{LoginDriver, LoginOptions};
use autologin_core::{
    ConfigStore, Configuration, CredentialResolver, Credentials, Outcome, Prompter,
    RuntimeEnvironment, classify,
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;

/// Everything that happens before a browser is started: the runtime
/// check, the configuration (created interactively if absent) and the
/// credentials for this attempt
pub fn prepare(
    env: &RuntimeEnvironment,
    prompter: &dyn Prompter,
) -> Result<(Configuration, Credentials), RunError> {
    env.ensure_browser_runtime()?;

    let store = ConfigStore::new(env.config_path());
    let config = store.load_or_create(prompter)?;
    let credentials = CredentialResolver::new(prompter).resolve(&config)?;

    Ok((config, credentials))
}

/// Run the whole workflow once
pub fn execute(env: &RuntimeEnvironment, options: LoginOptions) -> Result<Outcome, RunError> {
    run_interruptible(login(env, options))
}

async fn login(env: &RuntimeEnvironment, options: LoginOptions) -> Result<Outcome, RunError> {
    let prompt_env = env.clone();
    let (config, credentials) =
        prompt_blocking(move || prepare(&prompt_env, &TerminalPrompter::new())).await?;

    println!();
    println!("🚀 Starting browser automation...");

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));

    let driver = LoginDriver::new(env, options);
    let content = driver
        .perform_login(&config, &credentials, |step| {
            tracing::debug!("{}", step);
            spinner.set_message(step.to_string());
        })
        .await;
    spinner.finish_and_clear();

    let content = content?;
    Ok(classify(&content, &config.selectors.login_successful))
}

/// Print the result of a run and pick the exit status
pub fn report(result: Result<Outcome, RunError>) -> ExitCode {
    match result {
        Ok(Outcome::Success) => {
            println!("{}", style("✅ Login successful!").green().bold());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Failure) => {
            println!(
                "{}",
                style("❌ Login failed or login success indicator not found.").red()
            );
            ExitCode::SUCCESS
        }
        Err(RunError::Interrupted) => {
            let _ = console::Term::stdout().show_cursor();
            println!();
            println!("🚪 Process interrupted by user. Exiting.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("❌ {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
