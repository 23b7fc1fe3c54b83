//! DataLens CLI: the main entry point.
//!
//! Commands:
//! - `ask`  Single question or interactive analysis session
//! - `chart`  Build a chart from a JSON file or stored dataset
//! - `charts`  List or show stored charts
//! - `datasets`  Manage stored datasets
//! - `providers`  List configured providers and check reachability
//! - `config`  Show, locate, validate or initialise configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "datalens",
    about = "DataLens: conversational data analysis and charts",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to config file (default: ~/.datalens/config.toml)
    #[arg(short, long, global = true, env = "DATALENS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the analyst a question
    Ask {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Session to continue (a new one is generated if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Provider to use (defaults to `default_provider`)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Generate a chart
    Chart(commands::chart::ChartArgs),

    /// Inspect stored charts
    Charts {
        #[command(subcommand)]
        action: ChartsAction,
    },

    /// Manage datasets
    Datasets {
        #[command(subcommand)]
        action: DatasetsAction,
    },

    /// List configured providers
    Providers,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ChartsAction {
    /// List stored chart ids
    List,
    /// Print a stored chart as JSON
    Show { id: String },
}

#[derive(Subcommand)]
enum DatasetsAction {
    /// List stored datasets
    List,
    /// Print a dataset with its data
    Show { id: String },
    /// Import one dataset (or an array of them) from a JSON file
    Import { file: PathBuf },
    /// Delete a dataset
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration
    Validate,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ask {
            message,
            session,
            provider,
        } => commands::ask::run(config_path, message, session, provider).await?,
        Commands::Chart(args) => commands::chart::run(config_path, args).await?,
        Commands::Charts { action } => match action {
            ChartsAction::List => commands::charts::list(config_path).await?,
            ChartsAction::Show { id } => commands::charts::show(config_path, &id).await?,
        },
        Commands::Datasets { action } => match action {
            DatasetsAction::List => commands::datasets::list(config_path).await?,
            DatasetsAction::Show { id } => commands::datasets::show(config_path, &id).await?,
            DatasetsAction::Import { file } => {
                commands::datasets::import(config_path, &file).await?
            }
            DatasetsAction::Delete { id } => commands::datasets::delete(config_path, &id).await?,
        },
        Commands::Providers => commands::providers::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
        },
    }

    Ok(())
}
