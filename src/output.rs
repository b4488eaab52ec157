//! Output types: the validated summary and the run report.

use crate::config::{Audience, SummaryMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A complete, schema-checked summary ready for rendering.
///
/// Values produced by [`crate::pipeline::parse::parse_summary`] always have
/// non-blank `title`, `subtitle` and `link`, at least one non-blank bullet,
/// and a `narrative` exactly when the mode asks for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSummary {
    /// Headline, ≤10 words (advisory).
    pub title: String,
    /// One-line context, ≤20 words (advisory).
    pub subtitle: String,
    /// Storytelling paragraph, ≤100 words (advisory). Rich mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    /// Key takeaways, in the order the model gave them.
    pub bullets: Vec<String>,
    /// Source or infographic reference. Not checked to be a well-formed URL.
    pub link: String,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Pages in the source PDF.
    pub source_pages: usize,
    /// Characters extracted from the source.
    pub extracted_chars: usize,
    /// Characters actually embedded in the prompt.
    pub embedded_chars: usize,
    /// Whether the source was cut to the character budget.
    pub truncated: bool,
    /// Length of the full prompt in characters.
    pub prompt_chars: usize,
    /// Prompt tokens as reported by the provider, if any.
    pub input_tokens: Option<usize>,
    /// Completion tokens as reported by the provider, if any.
    pub output_tokens: Option<usize>,
    /// Transport retries used.
    pub retries: u32,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub audience: Audience,
    pub mode: SummaryMode,
    pub summary: StructuredSummary,
    /// Where the brief was written.
    pub output_path: PathBuf,
    pub stats: SummaryStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lean_summary_serialises_without_narrative() {
        let s = StructuredSummary {
            title: "T".into(),
            subtitle: "S".into(),
            narrative: None,
            bullets: vec!["a".into()],
            link: "https://example.com".into(),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("narrative"));
    }

    #[test]
    fn output_serialises_mode_lowercase() {
        let out = SummaryOutput {
            audience: Audience::new("Policy Maker").unwrap(),
            mode: SummaryMode::Lean,
            summary: StructuredSummary {
                title: "T".into(),
                subtitle: "S".into(),
                narrative: None,
                bullets: vec!["a".into()],
                link: "l".into(),
            },
            output_path: PathBuf::from("summary_for_Policy_Maker.pdf"),
            stats: SummaryStats::default(),
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["mode"], "lean");
        assert_eq!(v["audience"], "Policy Maker");
    }
}
