//! Reply parsing: raw model text → validated [`StructuredSummary`].
//!
//! Two steps with two distinct failure modes:
//!
//! 1. [`parse_json`]: strict JSON parse. Failure is a
//!    [`SummaryError::ParseFailure`] carrying the raw reply.
//! 2. [`validate`]: shape check against the schema the prompt asked for.
//!    Failure is a [`SummaryError::ValidationFailure`] naming the field.
//!
//! The renderer never sees a summary that skipped step 2, so it can rely on
//! every field being present.
//!
//! The only leniency is removing one outer Markdown code fence, which chat
//! models add even when told to return bare JSON. Prose around the JSON is
//! not tolerated.

use crate::config::SummaryMode;
use crate::error::{SummaryError, ValidationIssue};
use crate::output::StructuredSummary;
use crate::prompts::{NARRATIVE_MAX_WORDS, SUBTITLE_MAX_WORDS, TITLE_MAX_WORDS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\n(.*)\n```$").unwrap());

/// Remove a single Markdown code fence wrapping the whole reply.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Strictly parse a model reply as JSON.
pub fn parse_json(raw: &str) -> Result<Value, SummaryError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|e| {
        warn!("Failed to parse model reply as JSON: {}. Raw output:\n{}", e, raw);
        SummaryError::ParseFailure {
            detail: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

/// Parse and validate a model reply in one go.
pub fn parse_summary(raw: &str, mode: SummaryMode) -> Result<StructuredSummary, SummaryError> {
    let value = parse_json(raw)?;
    validate(&value, mode).map_err(|issue| {
        warn!("Model reply failed validation: {}", issue);
        SummaryError::ValidationFailure(issue)
    })
}

/// Check `value` against the schema for `mode` and build the summary.
///
/// Required: `title`, `subtitle`, `bullets`, `link`, plus `narrative` in
/// Rich mode. Strings must be non-blank; `bullets` must hold at least one
/// non-blank string. A `narrative` sent in Lean mode is dropped. Word limits
/// are advisory and only logged.
pub fn validate(value: &Value, mode: SummaryMode) -> Result<StructuredSummary, ValidationIssue> {
    let obj = value.as_object().ok_or(ValidationIssue::NotAnObject)?;

    let title = required_string(obj, "title")?;
    let subtitle = required_string(obj, "subtitle")?;
    let narrative = if mode.has_narrative() {
        Some(required_string(obj, "narrative")?)
    } else {
        None
    };
    let bullets = required_string_list(obj, "bullets")?;
    let link = required_string(obj, "link")?;

    check_word_limit("title", &title, TITLE_MAX_WORDS);
    check_word_limit("subtitle", &subtitle, SUBTITLE_MAX_WORDS);
    if let Some(ref n) = narrative {
        check_word_limit("narrative", n, NARRATIVE_MAX_WORDS);
    }

    Ok(StructuredSummary {
        title,
        subtitle,
        narrative,
        bullets,
        link,
    })
}

fn required_string(obj: &Map<String, Value>, field: &'static str) -> Result<String, ValidationIssue> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationIssue::Missing(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationIssue::Empty(field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ValidationIssue::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn required_string_list(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ValidationIssue> {
    let items = match obj.get(field) {
        None | Some(Value::Null) => return Err(ValidationIssue::Missing(field)),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationIssue::WrongType {
                field,
                expected: "an array of strings",
            })
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if s.trim().is_empty() => return Err(ValidationIssue::Empty(field)),
            Value::String(s) => out.push(s.trim().to_string()),
            _ => {
                return Err(ValidationIssue::WrongType {
                    field,
                    expected: "an array of strings",
                })
            }
        }
    }

    if out.is_empty() {
        return Err(ValidationIssue::Empty(field));
    }
    Ok(out)
}

fn check_word_limit(field: &str, text: &str, max_words: usize) {
    let words = text.split_whitespace().count();
    if words > max_words {
        debug!("{} has {} words (advisory limit {})", field, words, max_words);
    }
}
