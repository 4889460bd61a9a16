//! Competitor-analysis CLI entry point.
//!
//! This binary is the composition root for the system:
//!
//! 1. **Parse configuration**: the optional TOML file plus environment
//!    overrides, validated before any network call.
//! 2. **Wire observability**: `tracing-subscriber` to stderr and, when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: a [`llm::ChatCompletionsClient`] injected
//!    into the [`nodes::PipelineOrchestrator`].
//! 4. **Run once**: analyze the given company/competitor pair, print the
//!    JSON response on stdout and optionally append the report to an archive.
//!
//! Ctrl-C cancels the run at the next safe point. A failed run prints
//! `{"error": {...}}` and exits with status 1.

mod archive;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use llm::ChatCompletionsClient;
use nodes::{AgentResponse, CancellationToken, PipelineOrchestrator};
use pipeline::AnalysisRequest;
use tracing::{error, info, warn};

use crate::archive::{ArchiveRecord, ReportArchive};
use crate::config::AppConfig;
use crate::telemetry::LogFormat;

/// Analyze a competitor's social media presence and produce a strategy report.
#[derive(Debug, Parser)]
#[command(name = "competitor-analysis", version, about)]
struct Cli {
    /// The company the analysis is written for.
    #[arg(long)]
    company: String,

    /// Industry both companies operate in.
    #[arg(long)]
    industry: String,

    /// The competitor to analyze.
    #[arg(long)]
    competitor: String,

    /// Optional TOML configuration file.
    #[arg(long, env = "COMPETITOR_ANALYSIS_CONFIG")]
    config: Option<PathBuf>,

    /// Append successful reports to this JSON-lines file.
    #[arg(long)]
    archive: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _telemetry = telemetry::init(cli.log_format)?;

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let client = ChatCompletionsClient::new(config.llm)
        .context("failed to construct chat-completions client")?;
    info!(model = client.model(), "Configured generative text client");
    let orchestrator = PipelineOrchestrator::new(Arc::new(client), config.orchestrator);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let request = AnalysisRequest::new(cli.company, cli.industry, cli.competitor);
    let outcome = orchestrator.analyze(&request, &cancel).await;

    if let (Ok(run), Some(path)) = (&outcome, &cli.archive) {
        let archive = ReportArchive::new(path);
        match archive.append(&ArchiveRecord::new(&run.state, &run.result)).await {
            Ok(()) => info!(path = %archive.path().display(), "Report archived"),
            Err(e) => warn!(error = %e, "Failed to archive report"),
        }
    }
    if let Err(e) = &outcome {
        error!(error = %e, "Competitor analysis failed");
    }

    let response = AgentResponse::from(&outcome);
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    })
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Interrupt received, cancelling analysis");
            cancel.cancel();
        }
        Err(e) => warn!(error = %e, "Unable to listen for interrupt signal"),
    }
}
