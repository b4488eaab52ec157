//! End-to-end tests against the live OpenAI API.
//!
//! Gated behind `E2E_ENABLED` and `OPENAI_API_KEY` so they never run in CI
//! unless explicitly requested. The source paper is generated on the fly.
//!
//! Run with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test e2e -- --nocapture

use edgequake_pdf2brief::{
    render_to_bytes, summarize, ApiKey, Audience, StructuredSummary, SummaryConfig, SummaryMode,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED and OPENAI_API_KEY are both set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match std::env::var("OPENAI_API_KEY") {
            Ok(k) if !k.trim().is_empty() => ApiKey::new(k).unwrap(),
            _ => {
                println!("SKIP — OPENAI_API_KEY is not set");
                return;
            }
        }
    }};
}

fn paper_pdf(dir: &Path) -> PathBuf {
    let paper = StructuredSummary {
        title: "Urban tree canopy and summer heat".into(),
        subtitle: "A five-city observational study".into(),
        narrative: None,
        bullets: vec![
            "We measured surface temperatures in 412 neighbourhoods over three summers.".into(),
            "Each 10 percent increase in canopy cover lowered afternoon surface temperature by 1.2 C.".into(),
            "Low-income districts had on average 18 percent less canopy than high-income ones.".into(),
            "Heat-related emergency calls fell in districts that planted trees after 2015.".into(),
        ],
        link: "https://example.org/canopy-study".into(),
    };
    let path = dir.join("canopy.pdf");
    std::fs::write(&path, render_to_bytes(&paper, SummaryMode::Lean).unwrap()).unwrap();
    path
}

// ── Live tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_policy_maker_lean_live() {
    let key = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let input = paper_pdf(dir.path());

    let config = SummaryConfig::builder()
        .audience(Audience::new("Policy Maker").unwrap())
        .mode(SummaryMode::Lean)
        .api_key(key)
        .output_dir(dir.path())
        .max_retries(2)
        .build()
        .unwrap();

    let output = summarize(&input, &config)
        .await
        .expect("summarize() should succeed");

    assert!(output.output_path.ends_with("summary_for_Policy_Maker.pdf"));
    assert!(output.output_path.exists());
    assert!(!output.summary.bullets.is_empty());
    assert!(output.summary.narrative.is_none());
    println!("{:#?}", output.summary);
}

#[tokio::test]
async fn test_general_public_rich_live() {
    let key = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let input = paper_pdf(dir.path());

    let config = SummaryConfig::builder()
        .audience(Audience::new("General Public").unwrap())
        .mode(SummaryMode::Rich)
        .api_key(key)
        .output_dir(dir.path())
        .max_retries(2)
        .build()
        .unwrap();

    let output = summarize(&input, &config)
        .await
        .expect("summarize() should succeed");

    assert!(output.summary.narrative.is_some());
    let doc = lopdf::Document::load(&output.output_path).unwrap();
    assert!(!doc.get_pages().is_empty());
    println!(
        "{} — {} tokens in / {} out",
        output.summary.title,
        output.stats.input_tokens.unwrap_or(0),
        output.stats.output_tokens.unwrap_or(0)
    );
}
