//! Earth Engine REST client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use mrv_common::DateRange;

use crate::area::AreaOfInterest;
use crate::credentials::{authenticate, authenticate_from_env};
use crate::error::{DynamicWorldError, Result};
use crate::expression::{composite_image, label_histogram, Expression};
use crate::grid::ExportGrid;
use crate::service::{ClassificationService, RawHistogram};

pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

/// Connection settings for [`EarthEngineClient`].
#[derive(Debug, Clone)]
pub struct EarthEngineConfig {
    /// Base URL of the REST API, without the `/v1` suffix
    pub api_url: String,
    /// Cloud project billed for requests; defaults to the key's `project_id`
    pub project: Option<String>,
    /// Whole-request timeout
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project: None,
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl EarthEngineConfig {
    pub fn http_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()?)
    }
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    #[serde(default)]
    result: Value,
}

/// Authenticated client for one Earth Engine project.
pub struct EarthEngineClient {
    http: Client,
    api_url: String,
    project: String,
    token: String,
}

impl EarthEngineClient {
    /// Authenticate with the `SERVICE_ACCOUNT` key from the environment.
    pub async fn initialize(config: EarthEngineConfig) -> Result<Self> {
        let http = config.http_client()?;
        let credentials = authenticate_from_env(&http).await?;
        let project = config.project.clone().unwrap_or(credentials.project_id);
        Self::build(http, &config, project, credentials.token.value)
    }

    /// Authenticate with an explicit base64-encoded key.
    pub async fn initialize_with(config: EarthEngineConfig, encoded_key: &str) -> Result<Self> {
        let http = config.http_client()?;
        let credentials = authenticate(&http, encoded_key).await?;
        let project = config.project.clone().unwrap_or(credentials.project_id);
        Self::build(http, &config, project, credentials.token.value)
    }

    /// Use an access token obtained elsewhere.
    pub fn with_token(
        config: EarthEngineConfig,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let http = config.http_client()?;
        Self::build(http, &config, project.into(), token.into())
    }

    fn build(http: Client, config: &EarthEngineConfig, project: String, token: String) -> Result<Self> {
        info!(api_url = %config.api_url, project = %project, "Earth Engine client ready");
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project,
            token,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/projects/{}/{}", self.api_url, self.project, method)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Response> {
        let url = self.endpoint(method);
        debug!(url = %url, "POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DynamicWorldError::Service {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    /// Evaluate an expression with `value:compute`.
    pub async fn compute_value(&self, expression: &Expression) -> Result<Value> {
        let response = self
            .post("value:compute", &json!({ "expression": expression }))
            .await?;
        let parsed: ComputeValueResponse = response
            .json()
            .await
            .map_err(|e| DynamicWorldError::UnexpectedResponse(e.to_string()))?;
        Ok(parsed.result)
    }

    /// Render an image expression as a GeoTIFF with `image:computePixels`.
    pub async fn compute_pixels(&self, expression: &Expression, grid: &ExportGrid) -> Result<Bytes> {
        let body = json!({
            "expression": expression,
            "fileFormat": "GEO_TIFF",
            "grid": grid.to_pixel_grid(),
        });
        let response = self.post("image:computePixels", &body).await?;
        Ok(response.bytes().await?)
    }
}

/// Human-readable message from a Google API error body.
///
/// Handles `{"error": {"message": ..}}`, the OAuth
/// `{"error": .., "error_description": ..}` shape and plain text.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v["error"]["message"]
            .as_str()
            .or_else(|| v["error_description"].as_str())
            .or_else(|| v["error"].as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

/// Convert a `value:compute` histogram result into a [`RawHistogram`].
///
/// A null result means the area held no pixels.
pub(crate) fn parse_histogram(value: Value) -> Result<RawHistogram> {
    match value {
        Value::Null => Ok(RawHistogram::new()),
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, count)| match count.as_f64() {
                Some(count) => Ok((key, count)),
                None => Err(DynamicWorldError::UnexpectedResponse(format!(
                    "histogram count for {} is not a number: {}",
                    key, count
                ))),
            })
            .collect(),
        other => Err(DynamicWorldError::UnexpectedResponse(format!(
            "expected a histogram dictionary, got {}",
            other
        ))),
    }
}

#[async_trait]
impl ClassificationService for EarthEngineClient {
    #[instrument(skip(self, area), fields(range = %range))]
    async fn frequency_histogram(
        &self,
        range: &DateRange,
        area: &AreaOfInterest,
    ) -> Result<RawHistogram> {
        let value = self.compute_value(&label_histogram(range, area)).await?;
        let histogram = parse_histogram(value)?;
        debug!(classes = histogram.len(), "Received label histogram");
        Ok(histogram)
    }

    #[instrument(skip(self, area, grid), fields(range = %range, width = grid.width, height = grid.height))]
    async fn composite_geotiff(
        &self,
        range: &DateRange,
        area: &AreaOfInterest,
        grid: &ExportGrid,
    ) -> Result<Bytes> {
        let bytes = self.compute_pixels(&composite_image(range, area), grid).await?;
        debug!(bytes = bytes.len(), "Received composite GeoTIFF");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_google_shape() {
        let body = r#"{"error": {"code": 400, "message": "Image.load: collection not found", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Image.load: collection not found");
    }

    #[test]
    fn test_error_message_oauth_shape() {
        let body = r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#;
        assert_eq!(error_message(body), "Invalid JWT Signature.");
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("  Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response body");
    }

    #[test]
    fn test_parse_histogram() {
        let histogram = parse_histogram(json!({"1": 120.0, "null": 3})).unwrap();
        assert_eq!(histogram["1"], 120.0);
        assert_eq!(histogram["null"], 3.0);

        assert!(parse_histogram(Value::Null).unwrap().is_empty());
        assert!(parse_histogram(json!([1, 2])).is_err());
        assert!(parse_histogram(json!({"1": "many"})).is_err());
    }

    #[test]
    fn test_endpoint() {
        let config = EarthEngineConfig {
            api_url: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        let client = EarthEngineClient::with_token(config, "demo", "token").unwrap();
        assert_eq!(
            client.endpoint("value:compute"),
            "http://localhost:1234/v1/projects/demo/value:compute"
        );
    }
}
