//! Stage 2: upload the GPX file and scrape the generated file id.
//!
//! The upload reply is JSON with a single `count` key whose value is an HTML
//! fragment, e.g.
//!
//! ```text
//! {"count":"<a href=\"uploadProgress.php?f=8009945965089910\">...</a>"}
//! ```
//!
//! The file id is the `f` parameter of the progress link. When several
//! anchors match, the last one in document order is used.

use crate::config::WorkflowConfig;
use crate::error::{GotoesError, ScrapeError};
use crate::params::WorkflowParameters;
use crate::pipeline::token::Token;
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use scraper::{Html, Selector};
use std::fmt;
use tracing::{debug, info};

static UPLOAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"uploadProgress\.php\?f=([0-9]*)").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Multipart field holding the GPX bytes.
pub const FILE_FIELD: &str = "files[]";

/// JSON key of the upload reply.
const REPLY_KEY: &str = "count";

/// Service-assigned id of the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier(String);

impl FileIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upload the source file and return the id the service assigned to it.
pub async fn submit_upload(
    session: &Session,
    params: &WorkflowParameters,
    token: &Token,
) -> Result<FileIdentifier, GotoesError> {
    let path = params.gpx_file();
    // The file is read whole and closed before the request goes out.
    let bytes = tokio::fs::read(path).await.map_err(|e| GotoesError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Uploading {} ({} bytes)", path.display(), bytes.len());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track.gpx".to_string());
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/octet-stream")
        .map_err(|e| GotoesError::parse(format!("failed to build multipart body: {e}")))?;

    let mut form = Form::new().part(FILE_FIELD, part);
    for (name, value) in upload_fields(params, session.config(), token) {
        form = form.text(name, value);
    }

    let url = session.config().upload_url();
    let response = session
        .send(session.client().post(&url).multipart(form), &url)
        .await?;
    let status = response.status();
    let body = session.text(response, &url).await?;

    if !status.is_success() {
        return Err(GotoesError::HttpStatus {
            url,
            status: status.as_u16(),
            body,
        });
    }

    let file_id = extract_file_id(&body)?;
    debug!("file id: {}", file_id);
    Ok(file_id)
}

/// Text fields sent next to the file, in the order the web form sends them.
pub fn upload_fields(
    params: &WorkflowParameters,
    config: &WorkflowConfig,
    token: &Token,
) -> Vec<(&'static str, String)> {
    vec![
        ("timeZone", config.time_zone.clone()),
        ("spoofStartTime", params.start_time_field()),
        ("desiredSpeed", params.speed_field()),
        ("MoK", config.distance_unit.clone()),
        ("considerElevation", String::new()),
        ("needsTimeStamp", "Y".to_string()),
        ("convert_fit_files_to_csv", String::new()),
        ("check_if_modified_by_gotoes", String::new()),
        ("hasJava", "YES".to_string()),
        ("pif", token.as_str().to_string()),
    ]
}

/// Parse the JSON reply and pull the file id out of its HTML fragment.
pub fn extract_file_id(body: &str) -> Result<FileIdentifier, GotoesError> {
    let fragment = reply_fragment(body)?;
    Ok(find_file_id(&Html::parse_fragment(&fragment))?)
}

/// The HTML fragment stored under the reply's `count` key.
fn reply_fragment(body: &str) -> Result<String, GotoesError> {
    let reply: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| GotoesError::parse(format!("upload reply is not a JSON object: {e}")))?;

    match reply.get(REPLY_KEY) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(GotoesError::parse(format!(
            "'{REPLY_KEY}' in upload reply is not a string: {other}"
        ))),
        None => Err(GotoesError::parse(format!(
            "failed to find '{REPLY_KEY}' in upload reply"
        ))),
    }
}

/// Scan every anchor; the last matching `href` wins.
pub fn find_file_id(document: &Html) -> Result<FileIdentifier, ScrapeError> {
    let mut file_id = None;
    for anchor in document.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if let Some(caps) = UPLOAD_RE.captures(href) {
            file_id = caps.get(1).map(|m| m.as_str().to_string());
        }
    }

    match file_id {
        Some(id) if !id.is_empty() => Ok(FileIdentifier(id)),
        _ => Err(ScrapeError::FileIdNotFound),
    }
}
