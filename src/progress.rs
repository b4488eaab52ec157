//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::SummaryConfigBuilder::progress_callback`] to be told when
//! each stage starts, finishes or fails. The CLI uses it to drive a spinner
//! while the model call is in flight; library users can forward the events
//! to whatever they use for status reporting.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2brief::{Stage, SummaryConfig, SummaryProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl SummaryProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = SummaryConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn SummaryProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Extract,
    Prompt,
    Request,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extract => "extract",
            Stage::Prompt => "prompt",
            Stage::Request => "request",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Called by the pipeline around each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. The run ends right after this.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SummaryProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events.lock().unwrap().push(format!("error:{stage}:{error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Extract);
        cb.on_stage_complete(Stage::Extract, 12);
        cb.on_stage_error(Stage::Request, "timeout");
    }

    #[test]
    fn recorder_only_sees_overridden_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Request);
        rec.on_stage_complete(Stage::Request, 5);
        rec.on_stage_error(Stage::Render, "disk full");
        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start:request".to_string(), "error:render:disk full".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Prompt);
    }
}
