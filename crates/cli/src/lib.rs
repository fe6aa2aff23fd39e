pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use carewise_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use carewise_core::recommendations::RecommendationView;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "carewise",
    about = "Carewise personalization CLI",
    long_about = "Manage the Carewise database and inspect purchase patterns, recommendations, and health insights per customer.",
    after_help = "Examples:\n  carewise migrate\n  carewise seed\n  carewise recommend cust-maria --view page\n  carewise insights cust-maria"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a carewise.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the database URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset and verify it")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Recompute and print a customer's purchase patterns")]
    Patterns { customer_id: String },
    #[command(about = "Rank catalog products for a customer")]
    Recommend {
        customer_id: String,
        #[arg(long, default_value = "widget", help = "Result size preset: widget or page")]
        view: RecommendationView,
        #[arg(long, help = "Explicit result count, overriding the view preset")]
        top: Option<usize>,
    },
    #[command(about = "Derive health insights from a customer's conditions and orders")]
    Insights { customer_id: String },
    #[command(about = "Print the assembled customer profile and grouped order history")]
    Profile { customer_id: String },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Commands report config errors themselves; logging just falls back to defaults.
    let logging_config = AppConfig::load(options.clone()).unwrap_or_default();
    init_logging(&logging_config)?;

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Patterns { customer_id } => commands::patterns::run(options, &customer_id),
        Command::Recommend { customer_id, view, top } => {
            commands::recommend::run(options, &customer_id, view, top)
        }
        Command::Insights { customer_id } => commands::insights::run(options, &customer_id),
        Command::Profile { customer_id } => commands::profile::run(options, &customer_id),
    };

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}

/// Logs go to stderr so stdout stays a single JSON envelope.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
