//! Configuration types for audience-tailored summarisation.
//!
//! All run behaviour is controlled through [`SummaryConfig`], built via its
//! [`SummaryConfigBuilder`]. The API key lives here as an explicit value
//! rather than being read from the environment deep inside the request step,
//! so a missing key is reported before any file is parsed or any network
//! call is attempted.

use crate::error::SummaryError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default number of source characters embedded in the prompt.
pub const DEFAULT_CHAR_BUDGET: usize = 12_000;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Audience labels the prompt has been tuned against. Any other non-empty
/// label is accepted as well.
pub const KNOWN_AUDIENCES: &[&str] = &[
    "Policy Maker",
    "Media Content Creator",
    "Industry",
    "Academic",
    "General Public",
];

/// The reader segment a summary is written for, e.g. "Policy Maker".
///
/// The label is trimmed on construction and must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Audience(String);

impl Audience {
    pub fn new(label: impl AsRef<str>) -> Result<Self, SummaryError> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            return Err(SummaryError::InvalidConfig(
                "Audience label must not be empty".into(),
            ));
        }
        Ok(Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem of the rendered brief: `summary_for_<label>`.
    ///
    /// Each whitespace character becomes `_`, as do characters that are not
    /// safe inside a file name, so the result is always a single path
    /// component inside the output directory.
    pub fn file_stem(&self) -> String {
        let label: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        format!("summary_for_{label}")
    }
}

impl Default for Audience {
    fn default() -> Self {
        Self("General Public".to_string())
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Audience {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Audience::new(s)
    }
}

impl TryFrom<String> for Audience {
    type Error = SummaryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Audience::new(value)
    }
}

impl From<Audience> for String {
    fn from(a: Audience) -> Self {
        a.0
    }
}

/// Which summary shape to request and render.
///
/// | Mode | Prompt fields | Rendered blocks |
/// |------|---------------|-----------------|
/// | `Rich` | title, subtitle, narrative, bullets[3], link | header, title, subtitle, narrative, key points, link |
/// | `Lean` | title, subtitle, bullets[3], link | header, title, subtitle, key points |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Narrative paragraph plus clickable source link. (default)
    #[default]
    Rich,
    /// Title, subtitle and key points only.
    Lean,
}

impl SummaryMode {
    /// Whether this mode requests and renders a narrative paragraph.
    pub fn has_narrative(self) -> bool {
        matches!(self, SummaryMode::Rich)
    }

    /// Whether this mode renders the source/infographic link line.
    pub fn renders_link(self) -> bool {
        matches!(self, SummaryMode::Rich)
    }
}

/// An inference-service API key.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank strings.
    pub fn new(key: impl Into<String>) -> Result<Self, SummaryError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(SummaryError::ConfigMissing {
                key: "OPENAI_API_KEY".into(),
                hint: "The API key is empty. Set it with: export OPENAI_API_KEY=sk-...".into(),
            });
        }
        Ok(Self(key.trim().to_string()))
    }

    /// The raw secret, for handing to the provider client.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for one summarisation run.
///
/// Built via [`SummaryConfig::builder()`] or using
/// [`SummaryConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2brief::{Audience, SummaryConfig, SummaryMode};
///
/// let config = SummaryConfig::builder()
///     .audience(Audience::new("Policy Maker").unwrap())
///     .mode(SummaryMode::Lean)
///     .char_budget(8_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.char_budget, 8_000);
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Who the brief is written for. Also determines the output file name.
    pub audience: Audience,

    /// Rich (with narrative and link) or Lean. Default: Rich.
    pub mode: SummaryMode,

    /// Chat model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Inference-service API key. Required unless `backend` is set.
    pub api_key: Option<ApiKey>,

    /// Pre-constructed completion backend. Takes precedence over `api_key`.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Sampling temperature (0.0–2.0). Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 800.
    pub max_tokens: usize,

    /// Maximum source characters embedded in the prompt. Default: 12 000.
    ///
    /// Text beyond the budget is dropped, not summarised.
    pub char_budget: usize,

    /// Per-request timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Retries on transport failures only. Default: 0.
    ///
    /// Replies that fail to parse or validate are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Directory the brief is written to. Default: current directory.
    pub output_dir: PathBuf,

    /// Stage progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            audience: Audience::default(),
            mode: SummaryMode::default(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            backend: None,
            temperature: 0.5,
            max_tokens: 800,
            char_budget: DEFAULT_CHAR_BUDGET,
            api_timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            output_dir: PathBuf::from("."),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("audience", &self.audience)
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn CompletionBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("char_budget", &self.char_budget)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Where the brief for this config's audience is written.
    ///
    /// Deterministic in the audience label, so re-running overwrites.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.pdf", self.audience.file_stem()))
    }
}

/// Builder for [`SummaryConfig`].
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl fmt::Debug for SummaryConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SummaryConfigBuilder {
    pub fn audience(mut self, audience: Audience) -> Self {
        self.config.audience = audience;
        self
    }

    pub fn mode(mut self, mode: SummaryMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.config.api_key = Some(key);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn char_budget(mut self, n: usize) -> Self {
        self.config.char_budget = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummaryError> {
        let c = &self.config;
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(SummaryError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_tokens == 0 {
            return Err(SummaryError::InvalidConfig(
                "Max tokens must be ≥ 1".into(),
            ));
        }
        if c.char_budget == 0 {
            return Err(SummaryError::InvalidConfig(
                "Character budget must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(SummaryError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(SummaryError::InvalidConfig("Model must not be empty".into()));
        }
        Ok(self.config)
    }
}
