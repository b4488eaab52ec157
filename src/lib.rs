//! # edgequake-pdf2brief
//!
//! Turn a research paper (PDF) into a one-page, audience-tailored brief (PDF).
//!
//! A language model reads the paper's text and returns a structured summary
//! (title, subtitle, optional narrative, key points, link) written for a
//! named reader segment such as "Policy Maker" or "Industry". The summary is
//! validated and laid out as a small PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract  plain text of every page (lopdf, spawn_blocking)
//!  ├─ 2. Prompt   truncate to the character budget, wrap in instructions
//!  ├─ 3. Request  one chat completion, bounded by a timeout
//!  ├─ 4. Parse    strict JSON + schema validation
//!  └─ 5. Render   fixed layout → summary_for_<Audience>.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2brief::{summarize, ApiKey, Audience, SummaryConfig, SummaryMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SummaryConfig::builder()
//!         .audience(Audience::new("Policy Maker")?)
//!         .mode(SummaryMode::Lean)
//!         .api_key(ApiKey::new(std::env::var("OPENAI_API_KEY")?)?)
//!         .build()?;
//!     let output = summarize("paper.pdf", &config).await?;
//!     println!("Summary PDF generated: {}", output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Rich vs. Lean
//!
//! | Mode | Narrative | Link line | Use for |
//! |------|-----------|-----------|---------|
//! | `rich` (default) | yes, ≤100 words | yes, clickable | Readers who want context |
//! | `lean` | no | no | Skimmable one-pagers |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2brief` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2brief = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiKey, Audience, SummaryConfig, SummaryConfigBuilder, SummaryMode};
pub use error::{exit_code_for, ErrorKind, SummaryError, ValidationIssue};
pub use output::{StructuredSummary, SummaryOutput, SummaryStats};
pub use pipeline::llm::{BackendError, Completion, CompletionBackend, GenerationOptions, LlmBackend};
pub use pipeline::render::{render_summary, render_to_bytes};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, SummaryProgressCallback};
pub use prompts::build_prompt;
pub use summarize::{build_prompt_for, summarize, summarize_sync, summarize_with_backend};
