//! Top-level entry points: one call per workflow run.
//!
//! Each call builds its own [`Session`], so concurrent calls never share
//! cookies and nothing carries over between invocations.

use crate::config::WorkflowConfig;
use crate::error::GotoesError;
use crate::output::TimestampOutput;
use crate::params::WorkflowParameters;
use crate::pipeline::retrieve::ResultStream;
use crate::pipeline::upload::FileIdentifier;
use crate::session::Session;
use crate::workflow::Workflow;
use tracing::info;

/// Timestamp a GPX file through GOTOES and save the result.
///
/// The file goes to `params.output_file`, or to
/// `<config.download_dir>/GOTOES_<file id>.gpx` when that is `None`.
///
/// # Errors
/// Every failure is returned as [`GotoesError::StageFailed`] naming the
/// stage that failed, except configuration errors raised before the first
/// request.
///
/// # Example
/// ```rust,no_run
/// use gotoes_timestamp::{add_timestamps, WorkflowConfig, WorkflowParameters};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let params = WorkflowParameters::builder("ride.gpx")
///     .desired_speed(25)
///     .start_time_str("2024-05-01T08:00:00+02:00")?
///     .build()?;
/// let out = add_timestamps(&params, &WorkflowConfig::default()).await?;
/// println!("Downloaded file: {}", out.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn add_timestamps(
    params: &WorkflowParameters,
    config: &WorkflowConfig,
) -> Result<TimestampOutput, GotoesError> {
    info!(
        "Adding timestamps to {} at {} per hour from {}",
        params.gpx_file.display(),
        params.desired_speed,
        params.start_time_field()
    );
    let session = Session::new(config)?;
    Workflow::new(&session).run(params).await
}

/// Synchronous wrapper around [`add_timestamps`].
///
/// Creates a temporary tokio runtime internally.
pub fn add_timestamps_sync(
    params: &WorkflowParameters,
    config: &WorkflowConfig,
) -> Result<TimestampOutput, GotoesError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GotoesError::InvalidConfig(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(add_timestamps(params, config))
}

/// Run the remote stages only and hand back the unread result body.
///
/// Use this to pipe the timestamped track somewhere other than a file.
pub async fn fetch_timestamped(
    params: &WorkflowParameters,
    config: &WorkflowConfig,
) -> Result<(FileIdentifier, ResultStream), GotoesError> {
    let session = Session::new(config)?;
    Workflow::new(&session).run_to_stream(params).await
}
