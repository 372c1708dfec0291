//! Score Verifier
//!
//! Command-line host for the extraction pipeline: verifies one or more
//! dashboard screenshots against an expected account handle.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use social_score_verifier::config::load_config;
use social_score_verifier::history::{append_to_history, init_history};
use social_score_verifier::ocr::{locate_tesseract, TesseractRecognizer};
use social_score_verifier::{paths, ExtractionPipeline, SourceHint, VerificationRecord, VerificationResult};

#[derive(Parser, Debug)]
#[command(name = "score-verifier", version, about = "Verify social-score dashboard screenshots")]
struct Cli {
    /// Screenshots to verify (PNG/JPEG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Account handle the screenshots must belong to
    #[arg(long, env = "EXPECTED_HANDLE")]
    expected_handle: String,

    /// Dashboard source: auto, wallchain, kaito, xeet, cookie or mindoshare
    #[arg(long, default_value = "auto")]
    source: SourceHint,

    /// Config file (default: config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append every attempt to this CSV file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Print one JSON record per screenshot instead of a message
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    image: String,
    #[serde(flatten)]
    record: &'a VerificationRecord,
}

/// Installs the log subscriber: console plus `<exe_dir>/logs/score_verifier.log`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let timer = ChronoLocal::new("%H:%M:%S%.3f".to_string());

    let log_file = paths::ensure_directories().and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_log_file_path())
    });

    match log_file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(timer)
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .init(),
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(timer)
                .with_writer(std::io::stderr)
                .init();
            tracing::warn!("Could not open log file: {}", e);
        }
    }
}

/// Logs panics through the subscriber so they land in the log file too.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        tracing::error!("[PANIC]{} {}", location, msg);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();
    install_panic_hook();

    let config = load_config(cli.config.as_deref());
    let tesseract = locate_tesseract(
        config.tesseract_path.as_deref(),
        config.tessdata_dir.as_deref(),
        &config.language,
    )?;
    let recognizer = Arc::new(TesseractRecognizer::new(tesseract, config.language.clone()));
    let pipeline = Arc::new(ExtractionPipeline::new(recognizer, config.pipeline_settings()));

    if let Some(history) = &cli.history {
        init_history(history)?;
    }

    tracing::info!(
        images = cli.images.len(),
        concurrency = pipeline.gate().limit(),
        source = ?cli.source,
        "Verifying screenshots"
    );

    let mut tasks = JoinSet::new();
    for (idx, path) in cli.images.iter().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let path = path.clone();
        let hint = cli.source;
        let expected = cli.expected_handle.clone();
        tasks.spawn(async move {
            let result: Result<VerificationResult> = async {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(pipeline.verify(bytes.into(), hint, &expected).await?)
            }
            .await;
            (idx, path, result)
        });
    }

    let mut results = Vec::with_capacity(cli.images.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut failed = 0;
    for (_, path, result) in &results {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                failed += 1;
                tracing::error!("{}: verification failed: {:#}", path.display(), e);
                eprintln!("{}: verification failed: {:#}", path.display(), e);
                continue;
            }
        };

        if let Some(history) = &cli.history {
            if let Err(e) = append_to_history(history, &path.display().to_string(), result) {
                tracing::warn!("Failed to write history for {}: {:#}", path.display(), e);
            }
        }

        if cli.json {
            let record = result.to_record();
            let report = JsonReport {
                image: path.display().to_string(),
                record: &record,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}: {}", path.display(), result.message());
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} screenshots failed", failed, results.len()));
    }
    Ok(())
}
