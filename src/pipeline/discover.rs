//! Stage 3: load the download form and collect its hidden defaults.
//!
//! Reloading the upload page with the file id and the processing parameters
//! makes the service render a `combineParameters` form whose hidden inputs
//! carry server-computed defaults. Those defaults are posted back verbatim in
//! stage 4, plus three overrides selecting the output.

use crate::config::WorkflowConfig;
use crate::error::GotoesError;
use crate::form::FormFieldSet;
use crate::params::WorkflowParameters;
use crate::pipeline::upload::FileIdentifier;
use crate::session::Session;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static HIDDEN_INPUTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form[name=combineParameters] input").unwrap());

/// Fetch the download form and return its hidden fields plus the overrides.
///
/// An empty scrape is not an error: the result then holds only the overrides.
pub async fn discover_parameters(
    session: &Session,
    file_id: &FileIdentifier,
    params: &WorkflowParameters,
) -> Result<FormFieldSet, GotoesError> {
    let url = session.config().upload_url();
    let query = discovery_query(file_id, params, session.config());
    let response = session
        .send(session.client().get(&url).query(&query), &url)
        .await?;
    let body = session.text(response, &url).await?;

    let mut fields = scrape_hidden_fields(&Html::parse_document(&body));
    debug!("scraped {} hidden fields", fields.len());
    apply_overrides(&mut fields, session.config());
    Ok(fields)
}

/// Query arguments of the form page, in the order the web form sends them.
pub fn discovery_query(
    file_id: &FileIdentifier,
    params: &WorkflowParameters,
    config: &WorkflowConfig,
) -> Vec<(&'static str, String)> {
    vec![
        ("f", file_id.as_str().to_string()),
        ("timeZone", config.time_zone.clone()),
        ("needsTimeStamp", "Y".to_string()),
        ("timeShift", String::new()),
        ("MoK", config.distance_unit.clone()),
        ("desiredSpeed", params.speed_field()),
        ("spoofStartTime", params.start_time_field()),
        ("considerElevation", config.consider_elevation.clone()),
        ("reverseRoute", String::new()),
    ]
}

/// Every `type="hidden"` input of the `combineParameters` form, in document order.
///
/// Duplicate names are kept. Missing `name`/`value` attributes read as empty.
pub fn scrape_hidden_fields(document: &Html) -> FormFieldSet {
    document
        .select(&HIDDEN_INPUTS)
        .map(|input| input.value())
        .filter(|input| input.attr("type") == Some("hidden"))
        .map(|input| {
            (
                input.attr("name").unwrap_or_default(),
                input.attr("value").unwrap_or_default(),
            )
        })
        .collect()
}

/// Append the output selection. Existing fields with the same names stay.
pub fn apply_overrides(fields: &mut FormFieldSet, config: &WorkflowConfig) {
    fields.add("outputFormat", config.output_format.as_str());
    fields.add(
        "timeZoneAdjustmentFactor",
        config.time_zone_adjustment_factor.as_str(),
    );
    fields.add("ActivitySport", config.activity_sport.as_str());
}
