//! Prompt construction for audience-tailored summaries.
//!
//! Every prompt lives here so that changing the requested JSON shape means
//! editing exactly one place, and so unit tests can inspect the prompt
//! without a model in the loop. The schema shown to the model must stay in
//! step with [`crate::pipeline::parse::validate`], which enforces it.

use crate::config::{Audience, SummaryMode};

/// Example reply for [`SummaryMode::Rich`], embedded verbatim in the prompt.
pub const RICH_SCHEMA: &str = r#"{
  "title": "Short and engaging (max 10 words)",
  "subtitle": "Concise context (max 20 words)",
  "narrative": "A short paragraph (max 100 words) summarizing the key idea in a more natural, storytelling tone.",
  "bullets": [
    "Key takeaway 1",
    "Key takeaway 2",
    "Key takeaway 3"
  ],
  "link": "https://example.com/source-or-infographic"
}"#;

/// Example reply for [`SummaryMode::Lean`]: no narrative.
pub const LEAN_SCHEMA: &str = r#"{
  "title": "Short and engaging (max 10 words)",
  "subtitle": "Concise context (max 20 words)",
  "bullets": [
    "Key takeaway 1",
    "Key takeaway 2",
    "Key takeaway 3"
  ],
  "link": "https://example.com/source-or-infographic"
}"#;

/// Advisory word ceilings shown to the model.
pub const TITLE_MAX_WORDS: usize = 10;
pub const SUBTITLE_MAX_WORDS: usize = 20;
pub const NARRATIVE_MAX_WORDS: usize = 100;

/// The JSON example for a mode.
pub fn schema_for(mode: SummaryMode) -> &'static str {
    match mode {
        SummaryMode::Rich => RICH_SCHEMA,
        SummaryMode::Lean => LEAN_SCHEMA,
    }
}

/// Keep at most `budget` characters (Unicode scalar values) of `text`.
///
/// Returns the input unchanged when it already fits. The cut always falls
/// on a `char` boundary.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the user prompt asking for a JSON summary of `source_text`.
///
/// `source_text` is cut to `char_budget` characters first; that cut is
/// lossy by design and is the only length control applied.
pub fn build_prompt(
    source_text: &str,
    audience: &Audience,
    mode: SummaryMode,
    char_budget: usize,
) -> String {
    let text = truncate_chars(source_text, char_budget);
    format!(
        "You are an expert science communicator. Summarise the following research paper \
content for a {audience} audience.

Return the result **strictly as JSON** with the following fields:

{schema}

Only include information that is useful and relevant for someone in {audience}.

Text:
{text}",
        schema = schema_for(mode),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Audience {
        Audience::new("Policy Maker").unwrap()
    }

    #[test]
    fn truncate_shorter_text_is_unmodified() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn truncate_longer_text_to_exact_budget() {
        let text = "a".repeat(12_345);
        assert_eq!(truncate_chars(&text, 12_000).chars().count(), 12_000);
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let text = "ééééé";
        let cut = truncate_chars(text, 3);
        assert_eq!(cut, "ééé");
    }

    #[test]
    fn prompt_mentions_audience_twice() {
        let p = build_prompt("Some text", &policy(), SummaryMode::Rich, 100);
        assert_eq!(p.matches("Policy Maker").count(), 2);
        assert!(p.contains("for a Policy Maker audience"));
        assert!(p.contains("relevant for someone in Policy Maker"));
    }

    #[test]
    fn rich_prompt_requests_narrative() {
        let p = build_prompt("x", &policy(), SummaryMode::Rich, 100);
        assert!(p.contains("\"narrative\""));
        assert!(p.contains("\"link\""));
        assert!(p.contains("max 10 words"));
        assert!(p.contains("max 100 words"));
    }

    #[test]
    fn lean_prompt_omits_narrative() {
        let p = build_prompt("x", &policy(), SummaryMode::Lean, 100);
        assert!(!p.contains("narrative"));
        assert!(p.contains("\"bullets\""));
        assert!(p.contains("\"link\""));
    }

    #[test]
    fn prompt_embeds_truncated_source_only() {
        let source = format!("{}{}", "A".repeat(50), "B".repeat(50));
        let p = build_prompt(&source, &policy(), SummaryMode::Lean, 50);
        assert!(p.ends_with(&"A".repeat(50)));
        assert!(!p.contains('B'));
    }

    #[test]
    fn prompt_embeds_short_source_verbatim() {
        let source = "Photosynthesis converts light into chemical energy...";
        let p = build_prompt(source, &policy(), SummaryMode::Lean, 12_000);
        assert!(p.ends_with(source));
    }

    #[test]
    fn schemas_are_valid_json_with_three_bullets() {
        for mode in [SummaryMode::Rich, SummaryMode::Lean] {
            let v: serde_json::Value = serde_json::from_str(schema_for(mode)).unwrap();
            assert_eq!(v["bullets"].as_array().unwrap().len(), 3);
            assert_eq!(v.get("narrative").is_some(), mode.has_narrative());
        }
    }
}
