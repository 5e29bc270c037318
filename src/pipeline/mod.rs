//! The four remote stages of the timestamp workflow.
//!
//! Each submodule drives exactly one request/response exchange with the
//! GOTOES site and exposes the scraping step as a plain function over an
//! already-parsed document, so a change in upstream markup is fixed in one
//! place and can be tested without the network.
//!
//! ## Data Flow
//!
//! ```text
//! token ──▶ upload ──▶ discover ──▶ retrieve
//! (pif)     (file id)  (form fields) (body stream)
//! ```
//!
//! 1. [`token`]    : GET the landing page, regex out the `pif` token
//! 2. [`upload`]   : multipart POST of the GPX file, scrape the file id from
//!    the JSON-wrapped HTML reply
//! 3. [`discover`] : GET the form page, collect hidden inputs of
//!    `combineParameters` and append the output overrides
//! 4. [`retrieve`] : url-encoded POST of those fields, stream the result
//!
//! All four share one [`crate::session::Session`] so the service sees a
//! single browser session.

pub mod discover;
pub mod retrieve;
pub mod token;
pub mod upload;
