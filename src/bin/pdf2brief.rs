//! CLI binary for edgequake-pdf2brief.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SummaryConfig`, runs one summarisation and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2brief::config::{DEFAULT_CHAR_BUDGET, DEFAULT_MODEL, KNOWN_AUDIENCES};
use edgequake_pdf2brief::{
    build_prompt_for, exit_code_for, summarize, ApiKey, Audience, ProgressCallback, Stage,
    SummaryConfig, SummaryMode, SummaryProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Extract => "Extracting text…",
        Stage::Prompt => "Building prompt…",
        Stage::Request => "Waiting for the model…",
        Stage::Render => "Rendering brief…",
    }
}

impl SummaryProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<8} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        if stage == Stage::Render {
            self.bar.finish_and_clear();
        }
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<8} {}", red("✗"), stage.to_string(), red(&msg)));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rich brief for policy makers
  pdf2brief paper.pdf --audience "Policy Maker"

  # Lean brief (no narrative, no link line) into a folder
  pdf2brief paper.pdf --audience Industry --mode lean --output-dir briefs/

  # See exactly what would be sent to the model (no API key needed)
  pdf2brief paper.pdf --audience Academic --print-prompt

  # Machine-readable result
  pdf2brief paper.pdf --audience "Media Content Creator" --json

AUDIENCES:
  Any label works. Commonly used:
    Policy Maker, Media Content Creator, Industry, Academic, General Public

  The output file is summary_for_<Audience>.pdf with spaces replaced by
  underscores, e.g. summary_for_Policy_Maker.pdf. Re-running overwrites it.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (also read from ./.env)
  EDGEQUAKE_MODEL         Model ID when --model / PDF2BRIEF_MODEL is unset
  PDF2BRIEF_*             Every flag, e.g. PDF2BRIEF_AUDIENCE, PDF2BRIEF_MODE
  RUST_LOG                Log filter override (e.g. edgequake_pdf2brief=debug)

EXIT CODES:
  0  success            4  request failed or timed out
  1  other error        5  model reply not valid JSON / wrong shape
  2  configuration      6  could not write the brief
  3  text extraction
"#;

/// Summarise a research PDF into an audience-tailored brief PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2brief",
    version,
    about = "Summarise a research PDF into an audience-tailored brief PDF",
    long_about = "Extract the text of a research paper, ask a language model for a structured \
summary written for one audience, and lay the result out as a short PDF brief.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Target audience label (e.g. "Policy Maker", "Industry").
    #[arg(short, long, env = "PDF2BRIEF_AUDIENCE", default_value = "General Public")]
    audience: String,

    /// Layout variant: rich (narrative + link) or lean.
    #[arg(long, env = "PDF2BRIEF_MODE", value_enum, default_value = "rich")]
    mode: ModeArg,

    /// Directory to write summary_for_<Audience>.pdf into.
    #[arg(short, long, env = "PDF2BRIEF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Chat model ID. Falls back to EDGEQUAKE_MODEL, then gpt-3.5-turbo.
    #[arg(long, env = "PDF2BRIEF_MODEL")]
    model: Option<String>,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2BRIEF_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max tokens in the model reply.
    #[arg(long, env = "PDF2BRIEF_MAX_TOKENS", default_value_t = 800)]
    max_tokens: usize,

    /// Max characters of paper text embedded in the prompt.
    #[arg(long, env = "PDF2BRIEF_CHAR_BUDGET", default_value_t = DEFAULT_CHAR_BUDGET)]
    char_budget: usize,

    /// Model call timeout in seconds.
    #[arg(long, env = "PDF2BRIEF_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Retries on transport failures (never on bad replies).
    #[arg(long, env = "PDF2BRIEF_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Print the prompt to stdout and exit without calling the model.
    #[arg(long, env = "PDF2BRIEF_PRINT_PROMPT")]
    print_prompt: bool,

    /// Print the result (summary, output path, stats) as JSON.
    #[arg(long, env = "PDF2BRIEF_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2BRIEF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2BRIEF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2BRIEF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Rich,
    Lean,
}

impl From<ModeArg> for SummaryMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Rich => SummaryMode::Rich,
            ModeArg::Lean => SummaryMode::Lean,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", red("error:"), err);
            ExitCode::from(exit_code_for(err.as_ref()))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level feedback, so only errors are logged
    // while it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.print_prompt;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SummaryProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Prompt preview ───────────────────────────────────────────────────
    if cli.print_prompt {
        let prompt = build_prompt_for(&cli.input, &config)
            .await
            .context("Failed to build prompt")?;
        println!("{prompt}");
        return Ok(());
    }

    // ── Run summarisation ────────────────────────────────────────────────
    let output = summarize(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to summarise {}", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    println!("Summary PDF generated: {}", output.output_path.display());

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}  {} pages, {} chars{}  →  {}ms",
            green("✔"),
            bold(&output.summary.title),
            stats.source_pages,
            stats.embedded_chars,
            if stats.truncated { " (truncated)" } else { "" },
            stats.total_duration_ms,
        );
        if let (Some(input), Some(out)) = (stats.input_tokens, stats.output_tokens) {
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&input.to_string()),
                dim(&out.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `SummaryConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SummaryConfig> {
    let audience = Audience::new(&cli.audience).context("Invalid --audience")?;
    if !KNOWN_AUDIENCES.contains(&audience.as_str()) {
        tracing::info!("Using custom audience label '{}'", audience);
    }

    let model = cli
        .model
        .clone()
        .or_else(|| std::env::var("EDGEQUAKE_MODEL").ok())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut builder = SummaryConfig::builder()
        .audience(audience)
        .mode(cli.mode.into())
        .model(model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .char_budget(cli.char_budget)
        .api_timeout_secs(cli.api_timeout)
        .max_retries(cli.max_retries)
        .output_dir(cli.output_dir.clone());

    // A blank key is treated like a missing one; `summarize` reports it.
    if let Some(key) = cli.api_key.as_deref().and_then(|k| ApiKey::new(k).ok()) {
        builder = builder.api_key(key);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
