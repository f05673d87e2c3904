//! CLI command definitions, routing, and tracing setup.

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use contentlift_core::{
    GeminiClient, GenerationConfig, GenerativeModel, Pipeline, PipelineConfig, ProgressReporter,
    RunSummary,
};
use contentlift_shared::{AppConfig, init_config, load_config, resolve_secret};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Prompt sent by `models --probe`.
const PROBE_PROMPT: &str = "Write a one-sentence description of what AI is.";

/// Output budget for the probe reply.
const PROBE_MAX_OUTPUT_TOKENS: u32 = 100;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contentlift: rewrite your latest article after its top-ranking competitors.
#[derive(Parser)]
#[command(
    name = "contentlift",
    version,
    about = "Rewrite the latest stored article in the style of top-ranking competitor pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
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
    /// Optimize the most recent article and publish the rewrite.
    Run {
        /// Content store API base URL (overrides the config file).
        #[arg(long, env = "CONTENT_STORE_API_URL")]
        api_url: Option<String>,
    },

    /// List generation-capable models visible to the configured key.
    Models {
        /// Send a short test prompt to the first configured model.
        #[arg(long)]
        probe: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentlift=info",
        1 => "contentlift=debug",
        _ => "contentlift=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
        Command::Run { api_url } => cmd_run(api_url).await,
        Command::Models { probe } => cmd_models(probe).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(api_url: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(url) = api_url {
        config.content_store.base_url = url;
    }

    let llm_key = resolve_secret(&config.llm.api_key_env, "Gemini API key")?;
    let search_key = optional_secret(&config.search.api_key_env);
    let engine_id = optional_secret(&config.search.engine_id_env);
    if search_key.is_none() || engine_id.is_none() {
        warn!("search API credentials not set, competitor search will use the browser fallback");
    }

    info!(store = %config.content_store.base_url, "starting optimization run");

    let pipeline_config = PipelineConfig::from_app_config(&config, search_key, engine_id, llm_key);
    let pipeline = Pipeline::new(pipeline_config)?;

    let reporter = CliProgress::new()?;
    let summary = match pipeline.run(&reporter).await {
        Ok(summary) => summary,
        Err(e) => {
            reporter.spinner.abandon_with_message("Run failed");
            return Err(e.into());
        }
    };

    println!();
    println!("  Article optimized and published!");
    println!("  ID:         {}", summary.article_id);
    println!("  Original:   {}", summary.original_title);
    println!("  New title:  {}", summary.new_title);
    println!("  References: {}", summary.references);
    println!("  Length:     {} characters", summary.content_chars);
    println!("  Model:      {}", summary.model_used);
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_models(probe: bool) -> Result<()> {
    let config = load_config()?;
    let key = resolve_secret(&config.llm.api_key_env, "Gemini API key")?;
    let client = GeminiClient::new(&config.llm, key)?;

    let models = client.list_models().await?;
    let usable: Vec<_> = models
        .iter()
        .filter(|m| m.supports_generate_content())
        .collect();

    println!();
    println!("  Models supporting generateContent ({}):", usable.len());
    for model in &usable {
        println!("  - {}", model.id());
        if let Some(name) = &model.display_name {
            println!("      name:   {name}");
        }
        println!(
            "      tokens: {} in / {} out",
            limit(model.input_token_limit),
            limit(model.output_token_limit)
        );
    }
    println!();

    if probe {
        let model = config
            .llm
            .models
            .first()
            .ok_or_else(|| eyre!("no models configured under [llm] models"))?;
        let budget = GenerationConfig {
            temperature: config.llm.temperature,
            max_output_tokens: PROBE_MAX_OUTPUT_TOKENS,
        };

        info!(model = %model, "probing model");
        let reply = client.generate(model, PROBE_PROMPT, &budget).await?;
        println!("  Probe ({model}):");
        println!("  {}", reply.trim());
        println!();
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Env var value when set and non-blank.
fn optional_secret(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn limit(value: Option<u64>) -> String {
    value.map_or_else(|| "?".into(), |v| v.to_string())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
