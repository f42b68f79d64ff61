use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dashboard_analytics::{wordcloud, Pipeline, ReportGenerator};
use dashboard_core::config::AppConfig;
use dashboard_core::types::Feedback;
use dashboard_core::Dataset;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chatbot-dashboard",
    about = "Browser dashboard for chatbot usage statistics",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/chatbot-dashboard/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the CSV dataset path
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server (default)
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a markdown report for a filtered view
    Report {
        /// First day included (YYYY-MM-DD, default: first day in the data)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD, default: last day in the data)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Region to include (repeatable)
        #[arg(long = "region")]
        regions: Vec<String>,
        /// Feedback label to include (repeatable)
        #[arg(long)]
        feedback: Vec<String>,
    },

    /// Regenerate the word cloud asset
    Wordcloud,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chatbot_dashboard=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(data) = &cli.data {
        config.data.csv_path = data.clone();
    }

    match cli.command {
        Some(Commands::Config { action }) => handle_config_command(action, &config)?,
        Some(Commands::Report {
            start,
            end,
            regions,
            feedback,
        }) => {
            let pipeline = Pipeline::new(load_dataset(&config)?);
            let defaults = pipeline.default_criteria();
            let criteria = dashboard_core::FilterCriteria::between(
                start.unwrap_or(defaults.start_date),
                end.unwrap_or(defaults.end_date),
            )
            .with_regions(regions)
            .with_feedback(feedback.into_iter().map(Feedback::from));
            criteria.validate()?;

            print!("{}", ReportGenerator::markdown(&pipeline.run(&criteria)));
        }
        Some(Commands::Wordcloud) => {
            let dataset = load_dataset(&config)?;
            let path = wordcloud::write_wordcloud(&dataset, &config.assets)?;
            println!("Wrote {}", path.display());
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            serve(config).await?;
        }
        None => serve(config).await?,
    }

    Ok(())
}

/// Load the dataset, build the word cloud, and run the server until shutdown.
async fn serve(config: AppConfig) -> Result<()> {
    let dataset = load_dataset(&config)?;
    wordcloud::write_wordcloud(&dataset, &config.assets)?;
    tracing::info!(
        "Serving {} records, word cloud in {}",
        dataset.len(),
        config.assets.dir.display()
    );
    dashboard_server::serve(config, dataset).await
}

fn load_dataset(config: &AppConfig) -> Result<Arc<Dataset>> {
    let dataset = Dataset::load(&config.data.csv_path, config.data.strict_vocabulary)
        .with_context(|| format!("loading {}", config.data.csv_path.display()))?;
    Ok(Arc::new(dataset))
}

fn handle_config_command(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}
