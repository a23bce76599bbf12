//! Shotlist command-line front end.
//!
//! Analyzes one video and prints the shot cards as JSON on stdout. Progress
//! and logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shotlist_analysis::{GeminiAnalyzer, GeminiConfig};
use shotlist_media::{check_ffmpeg, FfmpegFrameExtractor, VideoBlob};
use shotlist_models::{PipelineSnapshot, PipelineStage, ShotCard};
use shotlist_pipeline::{with_retries, Pipeline, PipelineConfig};

/// Break a short video into shots with AI image-generation prompts
#[derive(Parser, Debug)]
#[command(name = "shotlist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Shot-level cinematographic breakdown of a short video")]
struct Cli {
    /// Video file to analyze
    video: PathBuf,

    /// Media type of the video (guessed from the extension when omitted)
    #[arg(long)]
    mime_type: Option<String>,

    /// Gemini model to use (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Leave thumbnail images out of the report
    #[arg(long)]
    no_thumbnails: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

/// Final report printed on stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    run_id: Option<String>,
    stage: PipelineStage,
    header: String,
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    thumbnails_captured: usize,
    cards: Vec<ShotCard>,
}

impl Report {
    fn new(snapshot: &PipelineSnapshot, hint: String, include_thumbnails: bool) -> Self {
        let failed = snapshot.stage == PipelineStage::Error;
        let mut cards = snapshot.cards();
        if !include_thumbnails {
            for card in &mut cards {
                card.thumbnail = None;
            }
        }

        Self {
            run_id: snapshot.run_id.as_ref().map(|id| id.to_string()),
            stage: snapshot.stage,
            header: snapshot.results_header(),
            source: snapshot.source_label(),
            error: snapshot.error_message.clone(),
            hint: failed.then_some(hint),
            thumbnails_captured: snapshot.ready_thumbnails(),
            cards,
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("shotlist=info,shotlist_pipeline=info,shotlist_analysis=info,shotlist_media=info")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    dotenvy::dotenv().ok();
    init_tracing();

    if !provider_installed {
        debug!("rustls crypto provider was already installed");
    }

    let cli = Cli::parse();
    info!("Starting shotlist");

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let mut gemini = GeminiConfig::from_env().context("Gemini is not configured")?;
    if let Some(model) = cli.model.clone() {
        gemini = gemini.with_model(model);
    }
    let analyzer = GeminiAnalyzer::new(gemini).context("Failed to create Gemini client")?;

    if let Err(e) = check_ffmpeg() {
        warn!("{}; thumbnails will be unavailable", e);
    }
    let capture = FfmpegFrameExtractor::new(config.capture_timeout.as_secs().max(1));

    let pipeline = Pipeline::new(
        config.clone(),
        with_retries(analyzer, config.analysis_max_retries),
        Arc::new(capture),
    );

    let blob = VideoBlob::from_path(&cli.video, cli.mime_type.clone())
        .await
        .with_context(|| format!("Cannot open {}", cli.video.display()))?;

    let mut updates = pipeline.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            info!(
                stage = %snapshot.stage,
                progress = snapshot.progress_percent,
                "{} {}",
                snapshot.step_label,
                snapshot.current_stage_label
            );
        }
    });

    let outcome = tokio::select! {
        result = pipeline.run(blob) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            pipeline.reset();
            progress.abort();
            return Ok(());
        }
    };
    progress.abort();

    let snapshot = outcome.context("Video rejected")?;
    let report = Report::new(&snapshot, pipeline.error_hint(), !cli.no_thumbnails);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    if snapshot.stage == PipelineStage::Error {
        error!(
            "Analysis failed: {}",
            snapshot.error_message.as_deref().unwrap_or_default()
        );
        std::process::exit(1);
    }

    info!("{} ({})", report.header, report.source.unwrap_or_default());
    Ok(())
}
