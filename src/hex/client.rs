//! HTTP client for the Hex REST API

use super::error::HexApiError;
use super::models::*;
use super::traits::HexApi;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://app.hex.tech/api/v1";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
const INITIAL_RATE_LIMIT: i64 = 60;

/// Options for a single API request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the default auth/content-type headers; same name wins
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    /// Attach a JSON-encoded body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(body).context("Failed to encode request body")?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Percent-encoded `key=value` pairs, kept in insertion order
#[derive(Debug, Default)]
struct QueryString {
    pairs: Vec<String>,
}

impl QueryString {
    fn push(&mut self, key: &str, value: &str) {
        self.pairs.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }

    fn append_to(&self, path: &str) -> String {
        if self.pairs.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.pairs.join("&"))
        }
    }
}

/// Client for the Hex REST API.
///
/// Holds the bearer token and the last rate-limit figures reported by the
/// API. The two figures are independent and overwritten after every response
/// that carries them.
pub struct HexClient {
    http_client: reqwest::Client,
    auth_header: HeaderValue,
    base_url: String,
    rate_limit_remaining: AtomicI64,
    rate_limit_reset_ms: AtomicI64,
}

impl HexClient {
    /// Create a new client.
    ///
    /// Fails when the token is empty. `base_url` defaults to [`DEFAULT_BASE_URL`].
    pub fn new(api_token: &str, base_url: Option<&str>) -> Result<Self> {
        let api_token = api_token.trim();
        if api_token.is_empty() {
            bail!("HEX_API_TOKEN is required");
        }

        let mut auth_header = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .context("HEX_API_TOKEN contains characters not allowed in a header")?;
        auth_header.set_sensitive(true);

        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client: reqwest::Client::new(),
            auth_header,
            base_url,
            rate_limit_remaining: AtomicI64::new(INITIAL_RATE_LIMIT),
            rate_limit_reset_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request against `{base_url}/{endpoint}` and decode the JSON body.
    ///
    /// Non-2xx responses become a [`HexApiError`]. An empty success body is
    /// decoded as JSON `null`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        debug!(method = %options.method, endpoint, "Hex API request");

        let mut builder = self
            .http_client
            .request(options.method, &url)
            .headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to reach Hex API at {}", url))?;

        self.record_rate_limit(response.headers());

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read Hex API response body")?;

        if !status.is_success() {
            let error = HexApiError::from_body(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                &text,
            );
            warn!(status = status.as_u16(), endpoint, "Hex API request failed");
            return Err(error.into());
        }

        let decoded = if text.trim().is_empty() {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_str(&text)
        };
        decoded.with_context(|| format!("Failed to parse Hex API response from {}", endpoint))
    }

    /// Overwrite the rate-limit snapshot from whichever headers are present
    fn record_rate_limit(&self, headers: &HeaderMap) {
        if let Some(remaining) = header_i64(headers, RATE_LIMIT_REMAINING) {
            self.rate_limit_remaining.store(remaining, Ordering::Relaxed);
        }
        if let Some(reset_secs) = header_i64(headers, RATE_LIMIT_RESET) {
            self.rate_limit_reset_ms
                .store(reset_secs.saturating_mul(1000), Ordering::Relaxed);
        }
    }

    /// Build an embed URL. Pure: no request is made.
    pub fn embed_url(&self, project_id: &str, params: &EmbedUrlParams) -> String {
        let mut query = QueryString::default();
        if let Some(view_mode) = params.view_mode {
            query.push("viewMode", view_mode.as_str());
        }
        if let Some(borderless) = params.borderless {
            query.push("borderless", &borderless.to_string());
        }
        if let Some(color_mode) = params.color_mode {
            query.push("colorMode", color_mode.as_str());
        }
        if let Some(hide_header) = params.hide_header {
            query.push("hideHeader", &hide_header.to_string());
        }
        if let Some(hide_sidebar) = params.hide_sidebar {
            query.push("hideSidebar", &hide_sidebar.to_string());
        }
        for (key, value) in params.inputs.iter().flatten() {
            query.push(&format!("inputs[{}]", key), &input_value_to_string(value));
        }

        query.append_to(&format!(
            "{}/project/{}/embed",
            self.base_url,
            urlencoding::encode(project_id)
        ))
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    let raw = headers.get(name)?;
    let parsed = raw.to_str().ok().and_then(|s| s.trim().parse::<i64>().ok());
    if parsed.is_none() {
        warn!(header = name, value = ?raw, "Ignoring unparsable rate-limit header");
    }
    parsed
}

fn input_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl HexApi for HexClient {
    async fn list_projects(&self, params: &ListProjectsParams) -> Result<ProjectList> {
        let mut query = QueryString::default();
        if let Some(limit) = params.limit.filter(|l| *l > 0) {
            query.push("limit", &limit.to_string());
        }
        if let Some(after) = params.after.as_deref().filter(|a| !a.is_empty()) {
            query.push("after", after);
        }
        for status in params.statuses.iter().flatten() {
            query.push("statuses", status);
        }

        let envelope: ProjectsEnvelope = self
            .request(&query.append_to("projects"), RequestOptions::get())
            .await?;
        Ok(envelope.into())
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.request(
            &format!("projects/{}", urlencoding::encode(project_id)),
            RequestOptions::get(),
        )
        .await
    }

    async fn get_project_inputs(&self, project_id: &str) -> Result<Vec<ProjectInput>> {
        // Still fetched so an unknown project fails the same way get_project does
        let _project = self.get_project(project_id).await?;
        debug!(project_id, "Hex API exposes no project inputs endpoint");
        Ok(Vec::new())
    }

    async fn run_project(
        &self,
        project_id: &str,
        params: &RunProjectParams,
    ) -> Result<ProjectRun> {
        self.request(
            &format!("project/{}/run", urlencoding::encode(project_id)),
            RequestOptions::post().json(params)?,
        )
        .await
    }

    async fn get_run_status(&self, project_id: &str, run_id: &str) -> Result<ProjectRun> {
        self.request(
            &format!(
                "project/{}/run/{}",
                urlencoding::encode(project_id),
                urlencoding::encode(run_id)
            ),
            RequestOptions::get(),
        )
        .await
    }

    async fn cancel_run(&self, project_id: &str, run_id: &str) -> Result<()> {
        let _: Value = self
            .request(
                &format!(
                    "project/{}/run/{}/cancel",
                    urlencoding::encode(project_id),
                    urlencoding::encode(run_id)
                ),
                RequestOptions::post(),
            )
            .await?;
        Ok(())
    }

    fn create_project_embed_url(&self, project_id: &str, params: &EmbedUrlParams) -> EmbedUrl {
        EmbedUrl {
            embed_url: self.embed_url(project_id, params),
        }
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        let reset_ms = self.rate_limit_reset_ms.load(Ordering::Relaxed);
        RateLimitInfo {
            remaining: self.rate_limit_remaining.load(Ordering::Relaxed),
            reset: DateTime::from_timestamp_millis(reset_ms).unwrap_or_else(Utc::now),
        }
    }
}
