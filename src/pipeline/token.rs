//! Stage 1: fetch the landing page and scrape the anti-forgery token.
//!
//! The landing page links to the upload tool with a `pif` query parameter.
//! The service refuses uploads that do not echo that value back, so it acts
//! as a single-use CSRF token.

use crate::error::{GotoesError, ScrapeError};
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fmt;
use tracing::debug;

static PIF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://gotoes\.org/strava/uploadtool\.php\?pif=([0-9a-z]{32})").unwrap()
});

/// Anti-forgery token scraped from the landing page. Valid for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// GET the landing page and extract the token from it.
pub async fn fetch_token(session: &Session) -> Result<Token, GotoesError> {
    let url = session.config().add_timestamps_url();
    let response = session.send(session.client().get(&url), &url).await?;
    let body = session.text(response, &url).await?;

    let token = extract_token(&Html::parse_document(&body))?;
    debug!("pif token: {}", token);
    Ok(token)
}

/// Find the token in the serialised document.
pub fn extract_token(document: &Html) -> Result<Token, ScrapeError> {
    let html = document.html();
    PIF_RE
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| Token(m.as_str().to_string()))
        .ok_or(ScrapeError::TokenNotFound)
}
