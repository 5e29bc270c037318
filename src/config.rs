//! Configuration for the GOTOES timestamp workflow.
//!
//! Everything that is fixed by the remote service but could plausibly drift
//! (base URL, form constants) or that a test needs to control (timeout,
//! target host) lives in [`WorkflowConfig`], built via
//! [`WorkflowConfigBuilder`]. The defaults reproduce exactly what the GOTOES
//! web form sends when a person fills it in by hand.

use crate::error::GotoesError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Public address of the GOTOES service.
pub const DEFAULT_BASE_URL: &str = "https://gotoes.org";

/// Browser identification sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Landing page holding the anti-forgery token.
pub const ADD_TIMESTAMPS_PATH: &str = "/gotoes/strava/Add_Timestamps_To_GPX.php";

/// Upload, form-fetch and download endpoint.
pub const UPLOAD_PATH: &str = "/gotoes/strava/upload.php";

/// Configuration for one workflow run.
///
/// Built via [`WorkflowConfig::builder()`] or using [`WorkflowConfig::default()`].
///
/// # Example
/// ```rust
/// use gotoes_timestamp::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .timeout_secs(30)
///     .activity_sport("Running")
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Scheme and host of the service, without a trailing slash. Default: `https://gotoes.org`.
    ///
    /// Endpoints, the `Origin` header and the `Referer` header all derive from it.
    pub base_url: String,

    /// Wall-clock limit for each individual HTTP call, in seconds. Default: 10.
    pub timeout_secs: u64,

    /// `User-Agent` header value. Default: a desktop Chrome string.
    pub user_agent: String,

    /// Time zone of the start time, as the service names it. Default: `Europe/Paris`.
    pub time_zone: String,

    /// Distance unit flag (`K` for kilometres, `M` for miles). Default: `K`.
    pub distance_unit: String,

    /// Elevation handling sent when fetching the download form. Default: `bikespeed`.
    pub consider_elevation: String,

    /// Requested output format override. Default: `GPX`.
    pub output_format: String,

    /// Time zone adjustment override, in seconds. Default: `3600`.
    pub time_zone_adjustment_factor: String,

    /// Activity sport label override. Default: `Biking`.
    pub activity_sport: String,

    /// Directory for the default output file name. Default: `downloaded`.
    pub download_dir: PathBuf,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            time_zone: "Europe/Paris".to_string(),
            distance_unit: "K".to_string(),
            consider_elevation: "bikespeed".to_string(),
            output_format: "GPX".to_string(),
            time_zone_adjustment_factor: "3600".to_string(),
            activity_sport: "Biking".to_string(),
            download_dir: PathBuf::from("downloaded"),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("time_zone", &self.time_zone)
            .field("distance_unit", &self.distance_unit)
            .field("consider_elevation", &self.consider_elevation)
            .field("output_format", &self.output_format)
            .field("time_zone_adjustment_factor", &self.time_zone_adjustment_factor)
            .field("activity_sport", &self.activity_sport)
            .field("download_dir", &self.download_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn StageProgressCallback>"),
            )
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }

    /// URL of the landing page; also the `Referer` of every request.
    pub fn add_timestamps_url(&self) -> String {
        format!("{}{}", self.base_url, ADD_TIMESTAMPS_PATH)
    }

    /// URL of the upload endpoint used by stages 2 to 4.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, UPLOAD_PATH)
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn time_zone(mut self, tz: impl Into<String>) -> Self {
        self.config.time_zone = tz.into();
        self
    }

    pub fn distance_unit(mut self, unit: impl Into<String>) -> Self {
        self.config.distance_unit = unit.into();
        self
    }

    pub fn consider_elevation(mut self, v: impl Into<String>) -> Self {
        self.config.consider_elevation = v.into();
        self
    }

    pub fn output_format(mut self, v: impl Into<String>) -> Self {
        self.config.output_format = v.into();
        self
    }

    pub fn time_zone_adjustment_factor(mut self, v: impl Into<String>) -> Self {
        self.config.time_zone_adjustment_factor = v.into();
        self
    }

    pub fn activity_sport(mut self, sport: impl Into<String>) -> Self {
        self.config.activity_sport = sport.into();
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, GotoesError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(GotoesError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        let url = reqwest::Url::parse(&c.base_url).map_err(|e| {
            GotoesError::InvalidConfig(format!("Invalid base URL '{}': {}", c.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GotoesError::InvalidConfig(format!(
                "Base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(self.config)
    }
}
