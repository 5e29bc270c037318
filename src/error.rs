//! Error types for the gotoes-timestamp library.
//!
//! Two error types reflect two different failure sources:
//!
//! * [`ScrapeError`]: an expected pattern was not found in markup served by
//!   the remote site. These almost always mean the upstream page changed, so
//!   they are kept separate from transport and parse failures. Each
//!   extraction function returns only this type.
//!
//! * [`GotoesError`]: everything the workflow can fail with. Each stage of
//!   the workflow wraps its own failure in [`GotoesError::StageFailed`] so the
//!   caller always knows how far the run got before it stopped.
//!
//! No error is retried. Every error is terminal for the invocation.

use crate::workflow::{Stage, WorkflowState};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the gotoes-timestamp library.
#[derive(Debug, Error)]
pub enum GotoesError {
    // ── Local I/O ─────────────────────────────────────────────────────────
    /// A local file could not be opened, read, created or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── HTTP ──────────────────────────────────────────────────────────────
    /// The request could not be sent or the body could not be read.
    #[error("Request to '{url}' failed: {source}\nCheck your internet connection.")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the per-call timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The service answered with a non-success status code.
    #[error("Unexpected status code {status} from '{url}'\nContent: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    // ── Response content ──────────────────────────────────────────────────
    /// A response body did not have the expected JSON or HTML structure.
    #[error("Malformed response: {detail}")]
    Parse { detail: String },

    /// An expected pattern was missing from the page markup.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    // ── Caller input ──────────────────────────────────────────────────────
    /// Builder validation failed for [`crate::config::WorkflowConfig`].
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Builder validation failed for [`crate::params::WorkflowParameters`].
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    // ── Workflow ──────────────────────────────────────────────────────────
    /// `run` was called on a workflow that already left `Idle`.
    #[error("Workflow already started (state: {0:?}); build a new one per run")]
    AlreadyStarted(WorkflowState),

    /// A workflow stage failed; `source` holds the underlying error.
    #[error("{stage} failed")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<GotoesError>,
    },
}

impl GotoesError {
    /// Wrap `self` with the name of the stage it happened in.
    pub fn in_stage(self, stage: Stage) -> Self {
        GotoesError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was raised in, if it went through the workflow.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            GotoesError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error, with every stage wrapper removed.
    pub fn root(&self) -> &GotoesError {
        match self {
            GotoesError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Map a reqwest error to `Timeout` or `Transport`.
    pub(crate) fn from_reqwest(url: &str, secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GotoesError::Timeout {
                url: url.to_string(),
                secs,
            }
        } else {
            GotoesError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }

    pub(crate) fn parse(detail: impl Into<String>) -> Self {
        GotoesError::Parse {
            detail: detail.into(),
        }
    }
}

/// An expected pattern was not found in markup served by the remote site.
///
/// Most likely cause: the upstream page structure changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// The anti-forgery token link is missing from the landing page.
    #[error("failed to find pif value in the landing page")]
    TokenNotFound,

    /// No anchor in the upload reply points at an upload-progress page.
    #[error("failed to find file id in the upload response")]
    FileIdNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_body() {
        let e = GotoesError::HttpStatus {
            url: "https://gotoes.org/gotoes/strava/upload.php".into(),
            status: 500,
            body: "<h1>oops</h1>".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("<h1>oops</h1>"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = GotoesError::Timeout {
            url: "https://gotoes.org".into(),
            secs: 10,
        };
        assert!(e.to_string().contains("10s"));
    }

    #[test]
    fn stage_wrapper_keeps_source() {
        let e = GotoesError::from(ScrapeError::TokenNotFound).in_stage(Stage::TokenExtraction);
        assert_eq!(e.stage(), Some(Stage::TokenExtraction));
        assert!(e.to_string().contains("token extraction"));
        assert!(matches!(
            e.root(),
            GotoesError::Scrape(ScrapeError::TokenNotFound)
        ));
        let source = std::error::Error::source(&e).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("failed to find pif value in the landing page")
        );
    }

    #[test]
    fn unwrapped_error_has_no_stage() {
        let e = GotoesError::InvalidConfig("bad".into());
        assert_eq!(e.stage(), None);
        assert!(matches!(e.root(), GotoesError::InvalidConfig(_)));
    }
}
