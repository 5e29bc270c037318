//! The timestamp workflow as an explicit linear state machine.
//!
//! ```text
//! Idle ─▶ TokenFetched ─▶ Uploaded ─▶ ParametersDiscovered ─▶ Downloaded ─▶ Saved
//!   └──────────┴─────────────┴───────────────┴──────────────────────┴─────▶ Failed
//! ```
//!
//! Each arrow is one stage. A failing stage moves the machine straight to
//! [`WorkflowState::Failed`], recording which stage failed, and its error is
//! returned wrapped in [`GotoesError::StageFailed`]. Nothing is retried or
//! rolled back: an upload that succeeded before a later failure stays on the
//! remote service.

use crate::error::GotoesError;
use crate::output::{self, TimestampOutput, WorkflowStats};
use crate::params::WorkflowParameters;
use crate::pipeline::retrieve::ResultStream;
use crate::pipeline::upload::FileIdentifier;
use crate::pipeline::{discover, retrieve, token, upload};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};

/// One transition of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    TokenExtraction,
    UploadSubmission,
    ParameterDiscovery,
    ResultRetrieval,
    Save,
}

impl Stage {
    /// State the stage starts from.
    pub fn from_state(self) -> WorkflowState {
        match self {
            Stage::TokenExtraction => WorkflowState::Idle,
            Stage::UploadSubmission => WorkflowState::TokenFetched,
            Stage::ParameterDiscovery => WorkflowState::Uploaded,
            Stage::ResultRetrieval => WorkflowState::ParametersDiscovered,
            Stage::Save => WorkflowState::Downloaded,
        }
    }

    /// State reached when the stage succeeds.
    pub fn to_state(self) -> WorkflowState {
        match self {
            Stage::TokenExtraction => WorkflowState::TokenFetched,
            Stage::UploadSubmission => WorkflowState::Uploaded,
            Stage::ParameterDiscovery => WorkflowState::ParametersDiscovered,
            Stage::ResultRetrieval => WorkflowState::Downloaded,
            Stage::Save => WorkflowState::Saved,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::TokenExtraction => "token extraction",
            Stage::UploadSubmission => "upload submission",
            Stage::ParameterDiscovery => "parameter discovery",
            Stage::ResultRetrieval => "result retrieval",
            Stage::Save => "save",
        })
    }
}

/// Where a workflow run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    TokenFetched,
    Uploaded,
    ParametersDiscovered,
    Downloaded,
    Saved,
    /// `stage` failed while leaving [`Stage::from_state`].
    Failed { stage: Stage },
}

/// A single run of the workflow over one [`Session`].
///
/// # Example
/// ```rust,no_run
/// use gotoes_timestamp::{Session, Workflow, WorkflowConfig, WorkflowParameters};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(&WorkflowConfig::default())?;
/// let params = WorkflowParameters::builder("ride.gpx").desired_speed(25).build()?;
///
/// let mut workflow = Workflow::new(&session);
/// let output = workflow.run(&params).await?;
/// println!("Downloaded file: {}", output.output_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workflow<'s> {
    session: &'s Session,
    state: WorkflowState,
    stats: WorkflowStats,
}

impl<'s> Workflow<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            state: WorkflowState::Idle,
            stats: WorkflowStats::default(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Per-stage timings recorded so far.
    pub fn stats(&self) -> &WorkflowStats {
        &self.stats
    }

    /// Run stages 1–4 and return the file id with the unread result body.
    ///
    /// Leaves the machine in `Downloaded`; the caller owns the stream.
    pub async fn run_to_stream(
        &mut self,
        params: &WorkflowParameters,
    ) -> Result<(FileIdentifier, ResultStream), GotoesError> {
        if self.state != WorkflowState::Idle {
            return Err(GotoesError::AlreadyStarted(self.state));
        }
        let session = self.session;

        let token = self
            .step(Stage::TokenExtraction, token::fetch_token(session))
            .await?;
        let file_id = self
            .step(
                Stage::UploadSubmission,
                upload::submit_upload(session, params, &token),
            )
            .await?;
        let fields = self
            .step(
                Stage::ParameterDiscovery,
                discover::discover_parameters(session, &file_id, params),
            )
            .await?;
        let stream = self
            .step(
                Stage::ResultRetrieval,
                retrieve::retrieve_result(session, &fields),
            )
            .await?;

        Ok((file_id, stream))
    }

    /// Run every stage and write the result to disk.
    pub async fn run(&mut self, params: &WorkflowParameters) -> Result<TimestampOutput, GotoesError> {
        let start = Instant::now();
        let (file_id, stream) = self.run_to_stream(params).await?;

        let path = output::output_path_for(
            params.output_file.as_deref(),
            &self.session.config().download_dir,
            &file_id,
        );
        let bytes_written = self
            .step(Stage::Save, output::save_stream(stream, &path))
            .await?;
        self.stats.total_ms = start.elapsed().as_millis() as u64;

        let out = TimestampOutput {
            file_id: file_id.to_string(),
            output_path: path,
            bytes_written,
            stats: self.stats.clone(),
        };
        info!(
            "Saved {} bytes to {} in {}ms",
            out.bytes_written,
            out.output_path.display(),
            out.stats.total_ms
        );
        if let Some(ref cb) = self.session.config().progress_callback {
            cb.on_workflow_complete(&out);
        }
        Ok(out)
    }

    /// Run one stage: advance on success, fail the machine otherwise.
    async fn step<T, F>(&mut self, stage: Stage, fut: F) -> Result<T, GotoesError>
    where
        F: Future<Output = Result<T, GotoesError>>,
    {
        let cb = self.session.config().progress_callback.clone();
        if let Some(ref cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();

        match fut.await {
            Ok(value) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                self.record(stage, elapsed_ms);
                self.state = stage.to_state();
                info!("{} done in {}ms", stage, elapsed_ms);
                if let Some(ref cb) = cb {
                    cb.on_stage_complete(stage, elapsed_ms);
                }
                Ok(value)
            }
            Err(e) => {
                self.state = WorkflowState::Failed { stage };
                warn!("{} failed: {}", stage, e);
                if let Some(ref cb) = cb {
                    cb.on_stage_error(stage, &e.to_string());
                }
                Err(e.in_stage(stage))
            }
        }
    }

    fn record(&mut self, stage: Stage, elapsed_ms: u64) {
        let slot = match stage {
            Stage::TokenExtraction => &mut self.stats.token_ms,
            Stage::UploadSubmission => &mut self.stats.upload_ms,
            Stage::ParameterDiscovery => &mut self.stats.discover_ms,
            Stage::ResultRetrieval => &mut self.stats.retrieve_ms,
            Stage::Save => &mut self.stats.save_ms,
        };
        *slot = elapsed_ms;
    }
}
