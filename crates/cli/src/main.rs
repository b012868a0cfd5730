//! Askdesk CLI
//!
//! Command-line front end for the role-filtered document assistant.
//! Every command runs as a specific role; the role decides which
//! departments retrieval may touch.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, PermissionsCommand, RebuildCommand, StatsCommand, SummaryCommand,
};
use askdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Askdesk - role-aware retrieval over internal documents
#[derive(Parser, Debug)]
#[command(name = "askdesk")]
#[command(about = "Role-aware retrieval over internal documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ASKDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ASKDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory of per-department documents
    #[arg(short, long, global = true, env = "ASKDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, scripted)
    #[arg(short, long, global = true, env = "ASKDESK_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "ASKDESK_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question as a given role
    Ask(AskCommand),

    /// Summarize one department's documents
    Summary(SummaryCommand),

    /// Show what a role is allowed to see
    Permissions(PermissionsCommand),

    /// Rebuild the document index from the data directory
    Rebuild(RebuildCommand),

    /// Show index and policy statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.data_dir,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    )?;
    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Askdesk CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure the .askdesk state directory exists
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Summary(_) => "summary",
        Commands::Permissions(_) => "permissions",
        Commands::Rebuild(_) => "rebuild",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Summary(cmd) => cmd.execute(&config).await,
        Commands::Permissions(cmd) => cmd.execute(&config),
        Commands::Rebuild(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
