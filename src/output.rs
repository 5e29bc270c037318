//! What a finished workflow run hands back to the caller.

use crate::error::GotoesError;
use crate::pipeline::retrieve::ResultStream;
use crate::pipeline::upload::FileIdentifier;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampOutput {
    /// Id the service assigned to the upload.
    pub file_id: String,
    /// Where the timestamped GPX was written.
    pub output_path: PathBuf,
    /// Size of the written file.
    pub bytes_written: u64,
    pub stats: WorkflowStats,
}

/// Wall-clock time spent in each stage, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub token_ms: u64,
    pub upload_ms: u64,
    pub discover_ms: u64,
    pub retrieve_ms: u64,
    pub save_ms: u64,
    pub total_ms: u64,
}

/// The explicit output path, or `<download_dir>/GOTOES_<id>.gpx`.
pub fn output_path_for(
    explicit: Option<&Path>,
    download_dir: &Path,
    file_id: &FileIdentifier,
) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => download_dir.join(format!("GOTOES_{}.gpx", file_id)),
    }
}

/// Stream the result body into `path`, creating parent directories.
///
/// The file is created before the first chunk arrives, so a failure mid-copy
/// leaves a truncated file behind.
pub async fn save_stream(stream: ResultStream, path: &Path) -> Result<u64, GotoesError> {
    let io_err = |source: std::io::Error| GotoesError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;

    let mut body = stream.into_stream();
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    debug!("wrote {} bytes to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_uses_file_id() {
        let p = output_path_for(
            None,
            Path::new("downloaded"),
            &FileIdentifier::new("8009945965089910"),
        );
        assert_eq!(p, PathBuf::from("downloaded/GOTOES_8009945965089910.gpx"));
    }

    #[test]
    fn explicit_path_wins() {
        let p = output_path_for(
            Some(Path::new("/tmp/out.gpx")),
            Path::new("downloaded"),
            &FileIdentifier::new("1"),
        );
        assert_eq!(p, PathBuf::from("/tmp/out.gpx"));
    }

    #[test]
    fn output_serialises_to_json() {
        let out = TimestampOutput {
            file_id: "42".into(),
            output_path: PathBuf::from("downloaded/GOTOES_42.gpx"),
            bytes_written: 1024,
            stats: WorkflowStats::default(),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains(r#""file_id":"42""#));
        let back: TimestampOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, out);
    }
}
