//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use solguide_service::{HttpObjectStore, HttpRecordStore, InstructionService};
use solguide_shared::{
    init_config, load_config, load_config_from, validate_api_keys, AppConfig, GenerationResult,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Solguide — consolidated SBIR/STTR submission instruction guides.
#[derive(Parser)]
#[command(
    name = "solguide",
    version,
    about = "Consolidate solicitation instruction PDFs into a single submission guide.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to an alternate config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of summary lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate the consolidated guide for one opportunity.
    Generate {
        /// Opportunity id in the record store.
        id: i64,
    },

    /// Generate guides for several opportunities, sequentially.
    Batch {
        /// Opportunity ids, processed in order.
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Generate guides for every live opportunity that is missing one.
    GenerateAll,

    /// Report whether an opportunity's guide needs regeneration.
    Check {
        /// Opportunity id in the record store.
        id: i64,
    },

    /// Write a default config file to ~/.solguide/solguide.toml.
    InitConfig,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "solguide=info",
        1 => "solguide=debug",
        _ => "solguide=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { id } => cmd_generate(id, cli.config.as_deref(), cli.json).await,
        Command::Batch { ids } => cmd_batch(&ids, cli.config.as_deref(), cli.json).await,
        Command::GenerateAll => cmd_generate_all(cli.config.as_deref(), cli.json).await,
        Command::Check { id } => cmd_check(id, cli.config.as_deref(), cli.json).await,
        Command::InitConfig => cmd_init_config(),
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    validate_api_keys(&config)?;
    Ok(config)
}

fn build_service(
    config: &AppConfig,
) -> Result<InstructionService<HttpRecordStore, HttpObjectStore>> {
    let records = HttpRecordStore::from_config(&config.record_store)?;
    let storage = HttpObjectStore::from_config(&config.object_store)?;
    Ok(InstructionService::new(records, storage, &config.generation)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(id: i64, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load(config_path)?;
    let service = build_service(&config)?;

    info!(id, "generating instruction guide");
    let result = service.generate_for_opportunity(id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

async fn cmd_batch(ids: &[i64], config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load(config_path)?;
    let service = build_service(&config)?;

    info!(count = ids.len(), "generating instruction guides");
    let spinner = batch_spinner(ids.len());
    let results = service.generate_batch(ids).await;
    spinner.finish_and_clear();

    report_batch(&results, json)
}

async fn cmd_generate_all(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load(config_path)?;
    let service = build_service(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message("Finding opportunities that need instruction guides...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let summary = service.generate_for_active().await?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.total == 0 {
        println!("No opportunities need instruction guides.");
        return Ok(());
    }

    for result in &summary.results {
        print_result(result);
    }
    println!();
    println!(
        "  Processed {} opportunities: {} succeeded, {} failed.",
        summary.total, summary.successful, summary.failed
    );
    Ok(())
}

async fn cmd_check(id: i64, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load(config_path)?;
    let service = build_service(&config)?;

    let needed = service.check_regeneration(id).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "opportunity_id": id,
                "needs_regeneration": needed,
            }))?
        );
    } else if needed {
        println!("Opportunity {id}: regeneration needed.");
    } else {
        println!("Opportunity {id}: guide is current.");
    }
    Ok(())
}

fn cmd_init_config() -> Result<()> {
    let path = init_config()?;
    println!("Created config file at {}", path.display());
    println!("Set the API key environment variables named there before generating.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_result(result: &GenerationResult) {
    if result.success {
        let url = result.artifact_url.as_deref().unwrap_or("-");
        println!(
            "  ok      {} ({}) -> {url}",
            result.opportunity_id, result.topic_number
        );
    } else {
        let error = result.error.as_deref().unwrap_or("unknown error");
        println!(
            "  failed  {} ({}): {error}",
            result.opportunity_id, result.topic_number
        );
    }
}

fn report_batch(results: &[GenerationResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    for result in results {
        print_result(result);
    }
    let successful = results.iter().filter(|r| r.success).count();
    println!();
    println!(
        "  Processed {} opportunities: {} succeeded, {} failed.",
        results.len(),
        successful,
        results.len() - successful
    );
    Ok(())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn batch_spinner(count: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Processing {count} opportunities..."));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
