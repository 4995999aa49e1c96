//! CLI for the Trac to GitHub migrator.
//!
//! Reads `migration.toml`, then migrates every configured Trac query into
//! its GitHub repository using the two-pass protocol.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trac_github_migrator::{
    list_rpc_methods, ConfigError, MigrationConfig, RunSummary, Runner, RunnerConfig, RunnerError,
    TracClient,
};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Trac to GitHub migrator - Move Trac tickets, comments and history into GitHub issues.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the migration config file.
    #[arg(long, default_value = "migration.toml")]
    config: PathBuf,

    /// GitHub token for the default account, if not set in the config file.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Load everything and show what would be created without writing to GitHub.
    #[arg(long)]
    dry_run: bool,

    /// Maximum repositories processed concurrently.
    #[arg(long, default_value_t = 5)]
    concurrency: usize,

    /// Print the Trac RPC methods and their help, then exit.
    #[arg(long)]
    list_rpc_methods: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    install_crypto_provider();

    // Parse arguments
    let args = Args::parse();

    if args.list_rpc_methods {
        return match print_rpc_methods(&args.config).await {
            Ok(()) => ExitCode::from(0),
            Err(e) => {
                error!(error = %e, "Failed to list Trac RPC methods");
                ExitCode::from(2)
            }
        };
    }

    // Run the main logic
    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.all_success() {
                ExitCode::from(0)
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Allow runtime log filtering via RUST_LOG env var (e.g., RUST_LOG=debug)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // Register as the global default subscriber
        .init();
}

/// Installs aws-lc-rs as the process-wide rustls crypto provider.
///
/// Returns false if another provider was installed first.
fn install_crypto_provider() -> bool {
    match rustls::crypto::aws_lc_rs::default_provider().install_default() {
        Ok(()) => true,
        Err(_) => {
            debug!("A rustls crypto provider was already installed");
            false
        }
    }
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    let config = RunnerConfig::new(args.config, args.token, args.dry_run, args.concurrency);
    let runner = Runner::new(config)?;
    runner.run().await
}

/// Prints every Trac RPC method with its indented help text.
async fn print_rpc_methods(config_path: &Path) -> Result<(), RunnerError> {
    let settings = MigrationConfig::load(config_path)?;
    let trac_url = settings
        .trac_url()
        .map_err(|message| ConfigError::ValidationError {
            path: config_path.display().to_string(),
            message,
        })?;
    let client = TracClient::new(&trac_url)?;

    for (method, help) in list_rpc_methods(&client).await? {
        println!("{method}");
        for line in help.lines() {
            println!("  {line}");
        }
        println!();
        println!();
    }
    Ok(())
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!(
        "  Repositories processed: {}",
        summary.repositories_processed
    );
    println!("  Repositories failed: {}", summary.repositories_failed);
    println!("  Tickets loaded: {}", summary.tickets_loaded);

    if !summary.dry_run {
        println!("  Issues created: {}", summary.issues_created);
        println!("  Issues matched: {}", summary.issues_matched);
        println!("  Issues completed: {}", summary.issues_completed);
        println!(
            "  Issues already complete: {}",
            summary.issues_already_complete
        );
        println!("  Tickets failed: {}", summary.tickets_failed);
    }

    if !summary.failures.is_empty() {
        println!("\nFailures:");
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
}
