//! Model interaction: send the prompt, bound the wait, parse the reply.
//!
//! The pipeline talks to the inference service through the
//! [`CompletionBackend`] port. [`LlmBackend`] is the production adapter over
//! `edgequake-llm`; tests plug in a scripted backend instead.
//!
//! ## Failure policy
//!
//! - The request is wrapped in `tokio::time::timeout`. Expiry is a
//!   [`SummaryError::RequestTimeout`].
//! - Transport failures may be retried with exponential backoff
//!   (`retry_backoff_ms * 2^attempt`, saturating) up to `max_retries` times. The default
//!   is zero retries.
//! - API and auth errors are never retried; neither is a reply that fails to
//!   parse or validate. Asking again would just burn tokens on the same
//!   answer.

use crate::config::{ApiKey, SummaryConfig, SummaryMode};
use crate::error::SummaryError;
use crate::output::StructuredSummary;
use crate::pipeline::parse;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Fixed generation parameters for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

impl GenerationOptions {
    pub fn from_config(config: &SummaryConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Raw reply from the inference service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Why a backend call failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Connection, DNS, TLS or 5xx-style failure. May be retried.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service rejected the request.
    #[error("api error: {0}")]
    Api(String),
    /// The credentials were refused.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transport(_))
    }
}

/// A text-in, text-out inference service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short provider name for diagnostics, e.g. "openai".
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Completion, BackendError>;
}

/// [`CompletionBackend`] over an `edgequake-llm` chat provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    name: String,
}

impl LlmBackend {
    /// OpenAI chat completions with an explicit key.
    pub fn openai(api_key: &ApiKey, model: &str) -> Self {
        let provider = OpenAIProvider::new(api_key.expose()).with_model(model);
        Self {
            provider: Arc::new(provider),
            name: "openai".to_string(),
        }
    }

    /// Wrap any already-configured provider.
    pub fn from_provider(provider: Arc<dyn LLMProvider>, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Completion, BackendError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_provider_error(&e.to_string()))?;

        Ok(Completion {
            content: response.content,
            input_tokens: Some(response.prompt_tokens as usize),
            output_tokens: Some(response.completion_tokens as usize),
        })
    }
}

static RE_AUTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:401|403)\b|\bunauthori[sz]ed\b|\b(?:invalid|incorrect) api key\b|\bauthentication\b",
    )
    .unwrap()
});

static RE_TRANSPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:500|502|503|504)\b|\btimed out\b|\btimeout\b|\bconnection (?:refused|reset|closed|aborted)\b|\berror sending request\b|\bdns\b|\btls\b|\boverloaded\b",
    )
    .unwrap()
});

/// Sort a provider error message into transport / auth / api.
///
/// edgequake-llm surfaces provider failures as text, so this goes by the
/// status codes and phrases the providers actually return. Status codes only
/// count as whole words: "4097 tokens" or "gpt-5000" are API errors.
pub fn classify_provider_error(message: &str) -> BackendError {
    if RE_AUTH.is_match(message) {
        BackendError::Auth(message.to_string())
    } else if RE_TRANSPORT.is_match(message) {
        BackendError::Transport(message.to_string())
    } else {
        BackendError::Api(message.to_string())
    }
}

/// Delay before retry number `attempt` (1-based), doubling each time.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// What the request stage hands back to the orchestrator.
#[derive(Debug, Clone)]
pub struct SummaryResponse {
    pub summary: StructuredSummary,
    pub input_tokens: Option<usize>,
    pub output_tokens: Option<usize>,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Send `prompt` once (plus transport retries) and return the validated summary.
pub async fn request_summary(
    backend: &dyn CompletionBackend,
    prompt: &str,
    mode: SummaryMode,
    config: &SummaryConfig,
) -> Result<SummaryResponse, SummaryError> {
    let start = Instant::now();
    let options = GenerationOptions::from_config(config);
    let limit = Duration::from_secs(config.api_timeout_secs);

    let mut attempt: u32 = 0;
    let completion = loop {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let result = match timeout(limit, backend.complete(prompt, &options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Request to '{}' timed out after {}s", backend.name(), config.api_timeout_secs);
                return Err(SummaryError::RequestTimeout {
                    secs: config.api_timeout_secs,
                });
            }
        };

        match result {
            Ok(completion) => break completion,
            Err(e) if e.is_transient() && attempt < config.max_retries => {
                warn!("Attempt {} failed: {}", attempt + 1, e);
                attempt += 1;
            }
            Err(BackendError::Auth(detail)) => {
                return Err(SummaryError::AuthError {
                    provider: backend.name().to_string(),
                    detail,
                });
            }
            Err(e) => {
                return Err(SummaryError::RequestFailed {
                    provider: backend.name().to_string(),
                    detail: e.to_string(),
                });
            }
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        "Reply: {} chars, {:?} input tokens, {:?} output tokens, {}ms",
        completion.content.len(),
        completion.input_tokens,
        completion.output_tokens,
        duration_ms
    );

    let summary = parse::parse_summary(&completion.content, mode)?;
    info!("Summary received: \"{}\" ({} bullets)", summary.title, summary.bullets.len());

    Ok(SummaryResponse {
        summary,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        retries: attempt,
        duration_ms,
    })
}
