use autologin_browser::LoginOptions;
use autologin_cli::commands::{self, package::PackageOptions};
use autologin_core::RuntimeEnvironment;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "autologin")]
#[command(author, version)]
#[command(
    about = "Log in to a web page with a headless browser, driven by a JSON configuration",
    long_about = "autologin reads (or interactively creates) a configuration describing a login page, \
                  its form selectors and a success indicator, fills in the form in a headless browser \
                  and reports whether the login succeeded."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: credentials.json next to the executable)
    #[arg(long, global = true, env = "AUTOLOGIN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the browser runtime
    #[arg(long, global = true, env = "AUTOLOGIN_BROWSERS_PATH", value_name = "DIR")]
    browser_path: Option<PathBuf>,

    /// Path to the Chrome/Chromium executable
    #[arg(long, global = true, value_name = "FILE")]
    chrome_path: Option<PathBuf>,

    /// Timeout in seconds for navigation and page elements
    #[arg(
        long,
        global = true,
        default_value_t = 30,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the login workflow (default when no command is given)
    Run,

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Package this executable and a browser runtime into a standalone bundle
    Package {
        /// Browser runtime directory to ship with the bundle
        #[arg(long, value_name = "DIR", required_unless_present = "clean")]
        browser_runtime: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "dist", value_name = "DIR")]
        output: PathBuf,

        /// Name of the packaged executable
        #[arg(long, default_value = "LoginApp")]
        name: String,

        /// Icon path without extension (.ico on Windows, .svg elsewhere)
        #[arg(long, value_name = "PATH")]
        icon: Option<PathBuf>,

        /// Remove previous build output and exit
        #[arg(long)]
        clean: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show where the configuration and browser runtime are resolved to
    Path,

    /// Print the configuration with the password masked
    Show,

    /// Create the configuration interactively
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let env = match RuntimeEnvironment::detect(cli.browser_path) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    let env = match cli.config {
        Some(path) => env.with_config_path(path),
        None => env,
    };
    tracing::debug!(
        "Run mode: {}, configuration: {}",
        env.mode().as_str(),
        env.config_path().display()
    );

    let options = LoginOptions {
        timeout: Duration::from_secs(cli.timeout),
        chrome_path: cli.chrome_path,
        ..LoginOptions::default()
    };

    // Execute the command
    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => return commands::run::report(commands::run::execute(&env, options)),
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(&env),
            ConfigAction::Show => commands::config::show(&env),
            ConfigAction::Init { force } => commands::config::init(&env, force),
        },
        Commands::Package {
            browser_runtime,
            output,
            name,
            icon,
            clean,
        } => commands::package::execute(&PackageOptions {
            browser_runtime,
            output,
            name,
            icon,
            clean,
        }),
        Commands::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "autologin", &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose {
        "autologin=debug,autologin_cli=debug,autologin_core=debug,autologin_browser=debug"
    } else {
        "autologin=warn,autologin_cli=warn,autologin_core=warn,autologin_browser=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
