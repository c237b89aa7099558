//! HTTP client for the Spring project and calendar APIs.
//!
//! One [`SpringIoClient`] is built at startup and shared by every tool call.
//! It owns the `reqwest` connection pool. Requests are single-shot: no
//! retries, no caching, one fixed timeout.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::springio::calendar::CalendarWindow;
use crate::springio::envelope::HalEnvelope;
use crate::springio::error::{SpringIoError, SpringIoResult};
use crate::springio::model::{Generation, Release, UpcomingRelease};

/// `Accept` value for the HAL-based projects API.
const HAL_JSON: &str = "application/hal+json";

/// `Accept` value for the calendar API.
const PLAIN_JSON: &str = "application/json";

/// User agent sent with every request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The two upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// Project metadata (releases, generations). Answers in HAL+JSON.
    Projects,
    /// Release calendar. Answers with a bare JSON array.
    Calendar,
}

impl Upstream {
    const fn accept(self) -> &'static str {
        match self {
            Self::Projects => HAL_JSON,
            Self::Calendar => PLAIN_JSON,
        }
    }
}

/// Client for the Spring upstream APIs.
#[derive(Debug, Clone)]
pub struct SpringIoClient {
    http: Client,
    projects_url: Url,
    calendar_url: Url,
}

impl SpringIoClient {
    /// Creates a client for the given base URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised (TLS
    /// backend setup).
    pub fn new(projects_url: Url, calendar_url: Url, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            projects_url,
            calendar_url,
        })
    }

    /// Lists all releases of a project.
    ///
    /// # Errors
    ///
    /// - [`SpringIoError::InvalidArgument`] if `project_id` is blank
    /// - [`SpringIoError::UpstreamRequestFailed`] on transport or status failure
    /// - [`SpringIoError::MalformedUpstreamResponse`] if the body does not match
    pub async fn project_releases(&self, project_id: &str) -> SpringIoResult<Vec<Release>> {
        let project_id = validate_project_id(project_id)?;
        let releases: Vec<Release> = self
            .fetch_embedded(&["projects", project_id, "releases"], "releases")
            .await?;

        if releases.iter().any(|r| r.version.trim().is_empty()) {
            let (host, path) =
                self.describe(Upstream::Projects, &["projects", project_id, "releases"]);
            return Err(SpringIoError::MalformedUpstreamResponse {
                host,
                path,
                reason: "release with empty version".to_string(),
            });
        }

        Ok(releases)
    }

    /// Lists the support generations of a project.
    ///
    /// # Errors
    ///
    /// Same as [`SpringIoClient::project_releases`].
    pub async fn project_generations(&self, project_id: &str) -> SpringIoResult<Vec<Generation>> {
        let project_id = validate_project_id(project_id)?;
        let generations: Vec<Generation> = self
            .fetch_embedded(&["projects", project_id, "generations"], "generations")
            .await?;

        for generation in generations.iter().filter(|g| !g.is_chronological()) {
            warn!(
                project = project_id,
                generation = %generation.name,
                "Support dates are out of order"
            );
        }

        Ok(generations)
    }

    /// Lists calendar entries inside `window`.
    ///
    /// # Errors
    ///
    /// - [`SpringIoError::UpstreamRequestFailed`] on transport or status failure
    /// - [`SpringIoError::MalformedUpstreamResponse`] if the body is not an
    ///   array of calendar entries
    pub async fn upcoming_releases(
        &self,
        window: CalendarWindow,
    ) -> SpringIoResult<Vec<UpcomingRelease>> {
        let segments = ["releases"];
        let body = self
            .fetch(Upstream::Calendar, &segments, &window.query())
            .await?;

        serde_json::from_value(body).map_err(|e| {
            let (host, path) = self.describe(Upstream::Calendar, &segments);
            SpringIoError::MalformedUpstreamResponse {
                host,
                path,
                reason: format!("expected an array of calendar entries: {e}"),
            }
        })
    }

    /// Issues a GET and returns the decoded JSON body.
    ///
    /// `segments` are appended to the upstream base URL, each one
    /// percent-encoded as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns [`SpringIoError::UpstreamRequestFailed`] if the request cannot
    /// be sent, the status is not 2xx, or the body is not JSON.
    pub async fn fetch(
        &self,
        upstream: Upstream,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> SpringIoResult<Value> {
        let url = self.url_for(upstream, segments);
        let (host, path) = host_and_path(&url);

        debug!(url = %url, query = ?query, "GET request");

        let failed = |status: Option<u16>, cause: String| SpringIoError::UpstreamRequestFailed {
            host: host.clone(),
            path: path.clone(),
            status,
            cause,
        };

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static(upstream.accept()))
            .query(query)
            .send()
            .await
            .map_err(|e| failed(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Upstream returned an error status");
            return Err(failed(Some(status.as_u16()), format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| failed(Some(status.as_u16()), format!("failed to read body: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| failed(Some(status.as_u16()), format!("body is not valid JSON: {e}")))
    }

    /// GETs a HAL collection and unwraps `_embedded.<key>`.
    async fn fetch_embedded<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        key: &str,
    ) -> SpringIoResult<Vec<T>> {
        let body = self.fetch(Upstream::Projects, segments, &[]).await?;

        HalEnvelope::from_value(body)
            .and_then(|envelope| envelope.unwrap_embedded(key))
            .map_err(|e| {
                let (host, path) = self.describe(Upstream::Projects, segments);
                SpringIoError::MalformedUpstreamResponse {
                    host,
                    path,
                    reason: e.to_string(),
                }
            })
    }

    fn url_for(&self, upstream: Upstream, segments: &[&str]) -> Url {
        let mut url = match upstream {
            Upstream::Projects => self.projects_url.clone(),
            Upstream::Calendar => self.calendar_url.clone(),
        };

        // Base URLs are validated as http(s) at config time, so they can be a base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn describe(&self, upstream: Upstream, segments: &[&str]) -> (String, String) {
        host_and_path(&self.url_for(upstream, segments))
    }
}

fn host_and_path(url: &Url) -> (String, String) {
    (
        url.host_str().unwrap_or_default().to_string(),
        url.path().to_string(),
    )
}

fn validate_project_id(project_id: &str) -> SpringIoResult<&str> {
    let trimmed = project_id.trim();
    if trimmed.is_empty() {
        return Err(SpringIoError::invalid_argument(
            "projectId",
            "must not be empty",
        ));
    }
    Ok(trimmed)
}
