//! One-shot summarisation entry points.
//!
//! A run handles exactly one (document, audience) pair:
//! extract → prompt → request → render. Any stage failure ends the run, and
//! nothing is written unless the summary has passed validation.

use crate::config::SummaryConfig;
use crate::error::SummaryError;
use crate::output::{SummaryOutput, SummaryStats};
use crate::pipeline::extract::{self, SourceText};
use crate::pipeline::llm::{self, CompletionBackend, LlmBackend};
use crate::pipeline::render;
use crate::progress::Stage;
use crate::prompts;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Summarise the PDF at `input` for `config.audience` and write the brief.
///
/// # Errors
/// - `ConfigMissing` when no backend and no API key are configured. This is
///   checked before the document is opened.
/// - Any extraction, request, timeout, parse, validation or render error
///   from the stage that failed.
pub async fn summarize(
    input: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    let backend = resolve_backend(config)?;
    summarize_with_backend(input, config, backend.as_ref()).await
}

/// Like [`summarize`], but with an explicit backend.
///
/// `config.backend` and `config.api_key` are ignored.
pub async fn summarize_with_backend(
    input: impl AsRef<Path>,
    config: &SummaryConfig,
    backend: &dyn CompletionBackend,
) -> Result<SummaryOutput, SummaryError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!(
        "Summarising {} for '{}' ({:?} mode)",
        input.display(),
        config.audience,
        config.mode
    );

    let mut stats = SummaryStats::default();

    // ── Step 1: Extract text ─────────────────────────────────────────────
    let source = run_stage(config, Stage::Extract, extract::extract_text(input)).await?;
    stats.source_pages = source.pages;
    stats.extracted_chars = source.char_count();
    stats.extract_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars from {} pages",
        stats.extracted_chars, stats.source_pages
    );

    // ── Step 2: Build prompt ─────────────────────────────────────────────
    let prompt = run_stage(config, Stage::Prompt, async {
        Ok(prompt_from_source(&source, config, &mut stats))
    })
    .await?;

    // ── Step 3: Request summary ──────────────────────────────────────────
    let response = run_stage(
        config,
        Stage::Request,
        llm::request_summary(backend, &prompt, config.mode, config),
    )
    .await?;
    stats.input_tokens = response.input_tokens;
    stats.output_tokens = response.output_tokens;
    stats.retries = response.retries;
    stats.llm_duration_ms = response.duration_ms;

    // ── Step 4: Render brief ─────────────────────────────────────────────
    let output_path = config.output_path();
    let render_start = Instant::now();
    let summary = response.summary;
    let mode = config.mode;
    run_stage(config, Stage::Render, async {
        let path = output_path.clone();
        let summary = summary.clone();
        tokio::task::spawn_blocking(move || render::render_summary(&summary, mode, &path))
            .await
            .map_err(|e| SummaryError::Internal(format!("Render task panicked: {}", e)))?
    })
    .await?;
    stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Brief written to {} in {}ms",
        output_path.display(),
        stats.total_duration_ms
    );

    Ok(SummaryOutput {
        audience: config.audience.clone(),
        mode,
        summary,
        output_path,
        stats,
    })
}

/// Extract `input` and return the exact prompt a run would send.
///
/// Needs neither a backend nor an API key.
pub async fn build_prompt_for(
    input: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<String, SummaryError> {
    let source = extract::extract_text(input.as_ref()).await?;
    let mut stats = SummaryStats::default();
    Ok(prompt_from_source(&source, config, &mut stats))
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a current-thread tokio runtime internally.
pub fn summarize_sync(
    input: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SummaryError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(input, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the backend: a pre-built one wins, otherwise OpenAI with the
/// configured key.
fn resolve_backend(config: &SummaryConfig) -> Result<Arc<dyn CompletionBackend>, SummaryError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    match config.api_key {
        Some(ref key) => Ok(Arc::new(LlmBackend::openai(key, &config.model))),
        None => Err(SummaryError::ConfigMissing {
            key: "OPENAI_API_KEY".to_string(),
            hint: "Set OPENAI_API_KEY in the environment or a .env file, \
                   or pass a key via SummaryConfigBuilder::api_key"
                .to_string(),
        }),
    }
}

fn prompt_from_source(source: &SourceText, config: &SummaryConfig, stats: &mut SummaryStats) -> String {
    let prompt = prompts::build_prompt(&source.text, &config.audience, config.mode, config.char_budget);
    stats.embedded_chars = source.char_count().min(config.char_budget);
    stats.truncated = source.char_count() > config.char_budget;
    stats.prompt_chars = prompt.chars().count();
    if stats.truncated {
        debug!(
            "Source truncated from {} to {} chars",
            source.char_count(),
            config.char_budget
        );
    }
    prompt
}

/// Run one stage, reporting start, completion and failure to the callback.
async fn run_stage<T>(
    config: &SummaryConfig,
    stage: Stage,
    fut: impl std::future::Future<Output = Result<T, SummaryError>>,
) -> Result<T, SummaryError> {
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let result = fut.await;
    if let Some(cb) = cb {
        match &result {
            Ok(_) => cb.on_stage_complete(stage, start.elapsed().as_millis() as u64),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}
