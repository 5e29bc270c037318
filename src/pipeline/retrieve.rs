//! Stage 4: post the download form and hand back the response body as a stream.

use crate::error::GotoesError;
use crate::form::FormFieldSet;
use crate::session::Session;
use bytes::Bytes;
use futures::stream::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// A boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, GotoesError>> + Send>>;

/// Live body of the processed file. The caller must consume it.
#[derive(Debug)]
pub struct ResultStream {
    response: Response,
    url: String,
    timeout_secs: u64,
}

impl ResultStream {
    /// `Content-Length` announced by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Consume the body chunk by chunk.
    pub fn into_stream(self) -> ByteStream {
        let url = self.url;
        let secs = self.timeout_secs;
        Box::pin(
            self.response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| GotoesError::from_reqwest(&url, secs, e))),
        )
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, GotoesError> {
        let url = self.url;
        let secs = self.timeout_secs;
        self.response
            .bytes()
            .await
            .map_err(|e| GotoesError::from_reqwest(&url, secs, e))
    }
}

/// POST the field set url-encoded and return the body stream on success.
///
/// Redirects follow the client's default policy.
pub async fn retrieve_result(
    session: &Session,
    fields: &FormFieldSet,
) -> Result<ResultStream, GotoesError> {
    let url = session.config().upload_url();
    let body = fields.encode()?;
    debug!("posting {} form fields", fields.len());

    let request = session
        .client()
        .post(&url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body);
    let response = session.send(request, &url).await?;

    let status = response.status();
    if !status.is_success() {
        let body = match session.text(response, &url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("failed to read error body from {}: {}", url, e);
                String::new()
            }
        };
        return Err(GotoesError::HttpStatus {
            url,
            status: status.as_u16(),
            body,
        });
    }

    Ok(ResultStream {
        response,
        url,
        timeout_secs: session.config().timeout_secs,
    })
}
