//! Per-run input: which file to timestamp, how fast, and from when.

use crate::error::GotoesError;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use std::path::{Path, PathBuf};

/// Immutable input of one workflow run.
///
/// Built via [`WorkflowParameters::builder`]. Speed is required; the start
/// time defaults to the current local time.
///
/// # Example
/// ```rust
/// use gotoes_timestamp::WorkflowParameters;
///
/// let params = WorkflowParameters::builder("ride.gpx")
///     .desired_speed(25)
///     .start_time_str("2024-05-01T08:00:00+02:00")
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(params.speed_field(), "25");
/// assert_eq!(params.start_time_field(), "2024-05-01T08:00:00+02:00");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowParameters {
    /// Source GPX track. Sent as opaque bytes.
    pub gpx_file: PathBuf,
    /// Desired average speed, in the configured distance unit per hour.
    pub desired_speed: u32,
    /// Timestamp of the first track point.
    pub start_time: DateTime<FixedOffset>,
    /// Form value of the start time: the caller's string when one was given.
    start_time_text: String,
    /// Where to write the result. `None` derives a name from the file id.
    pub output_file: Option<PathBuf>,
}

impl WorkflowParameters {
    pub fn builder(gpx_file: impl Into<PathBuf>) -> WorkflowParametersBuilder {
        WorkflowParametersBuilder {
            gpx_file: gpx_file.into(),
            desired_speed: None,
            start_time: None,
            start_time_text: None,
            output_file: None,
        }
    }

    /// Speed as sent in form fields.
    pub fn speed_field(&self) -> String {
        self.desired_speed.to_string()
    }

    /// Start time as sent in form fields.
    ///
    /// A string passed to [`WorkflowParametersBuilder::start_time_str`] goes
    /// out as given (trimmed). A `DateTime`, or the default of now, is
    /// rendered as RFC 3339 with whole seconds and `Z` for UTC.
    pub fn start_time_field(&self) -> String {
        self.start_time_text.clone()
    }

    pub fn gpx_file(&self) -> &Path {
        &self.gpx_file
    }
}

/// Builder for [`WorkflowParameters`].
#[derive(Debug)]
pub struct WorkflowParametersBuilder {
    gpx_file: PathBuf,
    desired_speed: Option<u32>,
    start_time: Option<DateTime<FixedOffset>>,
    start_time_text: Option<String>,
    output_file: Option<PathBuf>,
}

impl WorkflowParametersBuilder {
    pub fn desired_speed(mut self, speed: u32) -> Self {
        self.desired_speed = Some(speed);
        self
    }

    pub fn start_time(mut self, t: DateTime<FixedOffset>) -> Self {
        self.start_time = Some(t);
        self.start_time_text = None;
        self
    }

    /// Parse and set the start time from an RFC 3339 string.
    ///
    /// The string itself is what the service receives.
    pub fn start_time_str(mut self, s: &str) -> Result<Self, GotoesError> {
        self.start_time = Some(parse_start_time(s)?);
        self.start_time_text = Some(s.trim().to_string());
        Ok(self)
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Build the parameters, validating constraints.
    pub fn build(self) -> Result<WorkflowParameters, GotoesError> {
        let desired_speed = match self.desired_speed {
            Some(0) => {
                return Err(GotoesError::InvalidParameters(
                    "Desired speed must be a positive integer".into(),
                ))
            }
            Some(s) => s,
            None => {
                return Err(GotoesError::InvalidParameters(
                    "Desired speed is required".into(),
                ))
            }
        };
        let start_time = self
            .start_time
            .unwrap_or_else(|| DateTime::<FixedOffset>::from(Local::now()));
        let start_time_text = self
            .start_time_text
            .unwrap_or_else(|| start_time.to_rfc3339_opts(SecondsFormat::Secs, true));
        Ok(WorkflowParameters {
            gpx_file: self.gpx_file,
            desired_speed,
            start_time,
            start_time_text,
            output_file: self.output_file,
        })
    }
}

/// Parse an RFC 3339 timestamp such as `2024-05-01T08:00:00+02:00`.
pub fn parse_start_time(s: &str) -> Result<DateTime<FixedOffset>, GotoesError> {
    DateTime::parse_from_rfc3339(s.trim()).map_err(|e| {
        GotoesError::InvalidParameters(format!(
            "Start time '{}' is not RFC 3339 (e.g. 2024-05-01T08:00:00+02:00): {}",
            s, e
        ))
    })
}
