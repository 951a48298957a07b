//! EDA agent CLI.
//!
//! ```text
//! eda-agent run <DATASET>      full LLM pipeline, report to stdout or --output
//! eda-agent profile <DATASET>  offline profile plus one analysis, no LLM
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use eda_config::EdaConfig;
use eda_dataset::Frame;
use eda_engine::{Pipeline, PipelineOptions, render};
use eda_providers::LlmClient;
use eda_types::{FocusArea, ProblemType};

#[derive(Parser)]
#[command(name = "eda-agent", version, about = "LLM-guided exploratory data analysis")]
struct Cli {
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline on a CSV file.
    Run {
        dataset: PathBuf,

        /// Config file (defaults to ~/.eda-agent/config.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// groq, openai or claude.
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rows shown to the domain expert.
        #[arg(long)]
        sample_rows: Option<usize>,
    },

    /// Profile a CSV file and run one analysis without calling a model.
    Profile {
        dataset: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        /// regression, classification or clustering.
        #[arg(long, default_value = "clustering", value_parser = parse_problem_type)]
        problem_type: ProblemType,

        #[arg(long)]
        target: Option<String>,

        /// descriptive_analysis, correlation_analysis, outlier_detection or
        /// feature_ranking.
        #[arg(long, value_parser = parse_focus_area)]
        analysis: Option<FocusArea>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

fn parse_problem_type(raw: &str) -> Result<ProblemType, String> {
    match ProblemType::parse(raw) {
        ProblemType::Unknown => Err(format!("unknown problem type `{raw}`")),
        known => Ok(known),
    }
}

fn parse_focus_area(raw: &str) -> Result<FocusArea, String> {
    FocusArea::parse(raw).ok_or_else(|| format!("unknown analysis `{raw}`"))
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "Logging initialized");
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<EdaConfig> {
    match explicit {
        Some(path) => Ok(EdaConfig::load_from(path)?),
        None => Ok(EdaConfig::load()?.unwrap_or_default()),
    }
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

async fn run(
    dataset: &Path,
    config: &EdaConfig,
    provider: Option<&str>,
    model: Option<&str>,
    sample_rows: Option<usize>,
) -> Result<eda_engine::PipelineRun> {
    let frame = Frame::from_csv_path(dataset, &config.csv_options()?)?;

    let mut settings = config.analysis_settings();
    if let Some(rows) = sample_rows {
        settings.sample_rows = rows;
    }
    let api = config.api_config(provider, model)?;
    tracing::info!(provider = %api.provider(), model = %api.model(), "Using model");
    let client = LlmClient::new(api, config.retry_config())?;

    let pipeline = Pipeline::new(
        client,
        PipelineOptions {
            settings,
            repair_attempts: config.repair_attempts(),
        },
    );
    Ok(pipeline.run(&frame).await)
}

fn profile(
    dataset: &Path,
    config: &EdaConfig,
    problem_type: ProblemType,
    target: Option<&str>,
    analysis: Option<FocusArea>,
    format: OutputFormat,
) -> Result<String> {
    if problem_type.is_supervised() && target.is_none() {
        bail!("--target is required for {problem_type} problems");
    }
    let frame = Frame::from_csv_path(dataset, &config.csv_options()?)?;
    let settings = config.analysis_settings();

    let profile = eda_analysis::profile(&frame, problem_type, target)?;
    let output = analysis
        .map(|area| {
            eda_analysis::run_analysis(area, &frame, &profile, problem_type, target, &settings)
        })
        .transpose()?;

    Ok(match format {
        OutputFormat::Markdown => render::profile_markdown(&profile, output.as_ref()),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "problem_type": problem_type,
            "target": target,
            "profile": profile,
            "analysis": output,
        }))?,
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }
    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Command::Run {
            dataset,
            config,
            provider,
            model,
            format,
            output,
            sample_rows,
        } => {
            let config = load_config(config.as_deref())?;
            let run = run(
                &dataset,
                &config,
                provider.as_deref(),
                model.as_deref(),
                sample_rows,
            )
            .await?;
            let text = match format {
                OutputFormat::Markdown => render::markdown(&run),
                OutputFormat::Json => render::json(&run)?,
            };
            emit(&text, output.as_deref())?;
            if let Some(error) = &run.error {
                eprintln!("Error: {error}");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Profile {
            dataset,
            config,
            problem_type,
            target,
            analysis,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let text = profile(
                &dataset,
                &config,
                problem_type,
                target.as_deref(),
                analysis,
                format,
            )?;
            emit(&text, None)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
