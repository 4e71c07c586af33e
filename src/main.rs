//! GemEye command line entry point

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gem_eye::models::settings::resolve_api_key;
use gem_eye::services::render::{new_record_id, render_state};
use gem_eye::utils::paths::config_path;
use gem_eye::{
    AnalysisClient, AnalysisController, AnalysisPhase, AppConfig, AppError, ConfigService,
    SettingsUpdate,
};
use gem_eye_llm::{build_http_client, GeminiProvider, LlmProvider};

#[derive(Parser)]
#[command(name = "gem-eye", version)]
#[command(about = "Expert-level gemstone identification and valuation from a photo")]
struct Cli {
    /// Config file (defaults to ~/.gem-eye/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model override for this run
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a gemstone photograph
    Analyze {
        /// Image file to analyze
        image: PathBuf,

        /// Print the final state as JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify the credential and connectivity
    Check,
    /// List models available to the credential
    Models,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "gem_eye=debug,gem_eye_llm=debug"
    } else {
        "gem_eye=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn resolved_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(config_path()?),
    }
}

/// File, then environment, then command line
fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut service = match &cli.config {
        Some(path) => ConfigService::open(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigService::new().context("failed to load the default config")?,
    };

    service.overlay(AppConfig::env_overrides(env_var)?)?;
    service.overlay(SettingsUpdate {
        model: cli.model.clone(),
        ..Default::default()
    })?;

    Ok(service.get_config().clone())
}

fn build_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = resolve_api_key(env_var);
    if api_key.is_none() {
        warn!("no credential found in GEMINI_API_KEY or API_KEY");
    }

    let client = build_http_client(config.proxy.as_ref())?;
    let provider = GeminiProvider::with_client(config.provider_config(api_key), client);
    Ok(Arc::new(provider))
}

async fn analyze(
    config: &AppConfig,
    image: PathBuf,
    json: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let client = AnalysisClient::new(build_provider(config)?);
    let controller = Arc::new(AnalysisController::new(client));

    controller.select_image(&image).await?;
    info!(image = %image.display(), model = %config.model, "analyzing specimen");

    let mut task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.start_analysis().await }
    });

    let state = tokio::select! {
        joined = &mut task => joined?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            controller.reset().await;
            task.await?
        }
    };

    if state.phase() == AnalysisPhase::Idle {
        eprintln!("{}", AppError::Cancelled);
        return Ok(ExitCode::FAILURE);
    }

    let rendered = if json {
        serde_json::to_string_pretty(&state)? + "\n"
    } else {
        render_state(&state, new_record_id())
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{}", rendered),
    }

    Ok(if state.phase() == AnalysisPhase::Resolved {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Analyze {
            image,
            json,
            output,
        } => {
            let config = load_config(&cli)?;
            analyze(&config, image.clone(), *json, output.clone()).await
        }
        Command::Check => {
            let config = load_config(&cli)?;
            let provider = build_provider(&config)?;
            provider.health_check().await?;
            println!("{} is reachable with model {}", provider.name(), provider.model());
            Ok(ExitCode::SUCCESS)
        }
        Command::Models => {
            let config = load_config(&cli)?;
            let provider = build_provider(&config)?;
            match provider.list_models().await? {
                Some(models) => {
                    for model in models {
                        println!("{}", model);
                    }
                }
                None => println!("{} does not support model listing", provider.name()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Show => {
                    let config = load_config(&cli)?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Init { force } => {
                    let service = ConfigService::init(resolved_config_path(&cli)?, *force)?;
                    println!("Wrote {}", service.path().display());
                }
                ConfigAction::Path => {
                    println!("{}", resolved_config_path(&cli)?.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
