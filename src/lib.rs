//! # gotoes-timestamp
//!
//! Add synthetic timestamps to a GPX track by driving the
//! [GOTOES](https://gotoes.org) "Add Timestamps To GPX" web tool.
//!
//! ## Why this crate?
//!
//! Routes drawn in a planner have no timestamps, and most fitness sites reject
//! an activity without them. GOTOES computes plausible timestamps from a
//! desired average speed and a start time, but only through an HTML form.
//! This crate fills in that form the way a browser would and saves the file
//! it returns. The interpolation itself happens entirely on the service.
//!
//! ## Workflow Overview
//!
//! ```text
//! GPX
//!  │
//!  ├─ 1. Token     GET landing page, scrape the single-use `pif` token
//!  ├─ 2. Upload    multipart POST of the track, scrape the file id
//!  ├─ 3. Discover  GET the download form, collect its hidden defaults
//!  ├─ 4. Retrieve  url-encoded POST of the form, stream the result
//!  └─ 5. Save      write the body to disk
//! ```
//!
//! All stages share one cookie-carrying [`Session`]; any failure stops the
//! run and names the stage it happened in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gotoes_timestamp::{add_timestamps, WorkflowConfig, WorkflowParameters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = WorkflowParameters::builder("ride.gpx")
//!         .desired_speed(25)
//!         .build()?;
//!     let out = add_timestamps(&params, &WorkflowConfig::default()).await?;
//!     println!("Downloaded file: {}", out.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gotoes` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod form;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod timestamp;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use error::{GotoesError, ScrapeError};
pub use form::FormFieldSet;
pub use output::{TimestampOutput, WorkflowStats};
pub use params::{parse_start_time, WorkflowParameters, WorkflowParametersBuilder};
pub use pipeline::retrieve::{ByteStream, ResultStream};
pub use pipeline::token::Token;
pub use pipeline::upload::FileIdentifier;
pub use progress::{NoopProgressCallback, ProgressCallback, StageProgressCallback};
pub use session::Session;
pub use timestamp::{add_timestamps, add_timestamps_sync, fetch_timestamped};
pub use workflow::{Stage, Workflow, WorkflowState};
