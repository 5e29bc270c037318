//! The HTTP session shared by every stage of one workflow run.
//!
//! The remote site ties the token, the upload and the download form together
//! through its PHP session cookie, so all four stages must go through the same
//! cookie jar. A [`Session`] owns one `reqwest::Client` with its own jar and
//! is passed by reference into each stage. Nothing is global: two sessions
//! never share cookies.

use crate::config::WorkflowConfig;
use crate::error::GotoesError;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

/// Cookie-carrying HTTP client plus the configuration it was built from.
#[derive(Debug)]
pub struct Session {
    client: Client,
    config: WorkflowConfig,
}

impl Session {
    /// Build a fresh session with an empty cookie jar.
    ///
    /// Every request carries the header baseline (`User-Agent`, `Origin`,
    /// `Referer`); stage-specific headers are added per request on top of it.
    pub fn new(config: &WorkflowConfig) -> Result<Self, GotoesError> {
        let client = Client::builder()
            .default_headers(baseline_headers(config)?)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GotoesError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Send a request, mapping transport failures and timeouts.
    pub(crate) async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, GotoesError> {
        debug!("HTTP {}", url);
        request
            .send()
            .await
            .map_err(|e| GotoesError::from_reqwest(url, self.config.timeout_secs, e))
    }

    /// Read a full response body as text.
    pub(crate) async fn text(&self, response: Response, url: &str) -> Result<String, GotoesError> {
        response
            .text()
            .await
            .map_err(|e| GotoesError::from_reqwest(url, self.config.timeout_secs, e))
    }
}

/// Headers sent with every request of the session.
fn baseline_headers(config: &WorkflowConfig) -> Result<HeaderMap, GotoesError> {
    let value = |name: &str, v: &str| {
        HeaderValue::from_str(v)
            .map_err(|_| GotoesError::InvalidConfig(format!("{name} is not a valid header value")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, value("User agent", &config.user_agent)?);
    headers.insert(ORIGIN, value("Base URL", &config.base_url)?);
    headers.insert(REFERER, value("Referer", &config.add_timestamps_url())?);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_has_three_headers() {
        let headers = baseline_headers(&WorkflowConfig::default()).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[ORIGIN], "https://gotoes.org");
        assert_eq!(
            headers[REFERER],
            "https://gotoes.org/gotoes/strava/Add_Timestamps_To_GPX.php"
        );
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("Mozilla/5.0"));
    }

    #[test]
    fn invalid_user_agent_rejected() {
        let config = WorkflowConfig::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap();
        let err = Session::new(&config).unwrap_err();
        assert!(matches!(err, GotoesError::InvalidConfig(_)));
    }

    #[test]
    fn session_keeps_config() {
        let config = WorkflowConfig::builder().timeout_secs(3).build().unwrap();
        let session = Session::new(&config).unwrap();
        assert_eq!(session.config().timeout_secs, 3);
    }
}
