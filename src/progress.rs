//! Progress-callback trait for per-stage workflow events.
//!
//! Inject an [`Arc<dyn StageProgressCallback>`] via
//! [`crate::config::WorkflowConfigBuilder::progress_callback`] to be told when
//! each remote stage starts, finishes or fails. The CLI uses it to drive a
//! spinner; library callers can forward the events anywhere.
//!
//! # Example
//!
//! ```rust
//! use gotoes_timestamp::{Stage, StageProgressCallback, WorkflowConfig};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl StageProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = WorkflowConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn StageProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::TimestampOutput;
use crate::workflow::Stage;
use std::sync::Arc;

/// Called by the workflow as it moves from stage to stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run strictly one after another.
pub trait StageProgressCallback: Send + Sync {
    /// Called just before a stage sends its request.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finished successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage failed. No later stage will start.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the result file was written.
    fn on_workflow_complete(&self, output: &TimestampOutput) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl StageProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WorkflowConfig`].
pub type ProgressCallback = Arc<dyn StageProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl StageProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::TokenExtraction);
        cb.on_stage_complete(Stage::TokenExtraction, 12);
        cb.on_stage_error(Stage::UploadSubmission, "boom");
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::ParameterDiscovery);
        rec.on_stage_complete(Stage::ParameterDiscovery, 5);
        rec.on_stage_error(Stage::ResultRetrieval, "HTTP 500");
        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            [
                "start parameter discovery",
                "error result retrieval: HTTP 500"
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Save);
    }
}
