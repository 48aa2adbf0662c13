//! HTTP transport for the export engine

use super::{ExportApi, ExportEndpoints};
use crate::config::ExportApiConfig;
use crate::core::job::ExportJobSpec;
use crate::domain::{CourierError, ExportApiError, JobId, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::time::Duration;

/// reqwest-backed [`ExportApi`]
///
/// # Example
///
/// ```no_run
/// use courier::adapters::export_api::HttpExportApi;
/// use courier::config::ExportApiConfig;
///
/// # fn example() -> courier::domain::Result<()> {
/// let config = ExportApiConfig::default();
/// let api = HttpExportApi::new(&config.base_url, &config)?;
/// # Ok(())
/// # }
/// ```
pub struct HttpExportApi {
    client: Client,
    base_url: String,
    endpoints: ExportEndpoints,
    submit_timeout: Duration,
    poll_timeout: Duration,
}

impl HttpExportApi {
    /// Create a transport for `base_url` with timeouts from `config`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is empty or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, config: &ExportApiConfig) -> Result<Self> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(CourierError::Configuration(
                "export API base URL is empty".to_string(),
            ));
        }

        let mut builder = ClientBuilder::new().connect_timeout(Duration::from_secs(10));
        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(|e| {
            CourierError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            endpoints: ExportEndpoints::new(base_url),
            submit_timeout: Duration::from_secs(config.submit_timeout_seconds),
            poll_timeout: Duration::from_secs(config.poll_timeout_seconds),
        })
    }

    /// Normalized endpoints
    pub fn endpoints(&self) -> &ExportEndpoints {
        &self.endpoints
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<serde_json::Value> {
        let resp = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| transport_error(url, e))?;

        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "Export engine returned error status");
            return Err(ExportApiError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            ExportApiError::InvalidResponse(format!("non-JSON response from {url}: {e}")).into()
        })
    }
}

#[async_trait]
impl ExportApi for HttpExportApi {
    async fn submit(&self, spec: &ExportJobSpec) -> Result<serde_json::Value> {
        let url = self.endpoints.export();
        tracing::debug!(url, entries = spec.export_list.len(), "POST export job");

        let request = self
            .client
            .post(url)
            .timeout(self.submit_timeout)
            .json(spec);
        self.send(request, url).await
    }

    async fn final_message(&self, job_id: &JobId) -> Result<serde_json::Value> {
        let url = self.endpoints.final_message_for(job_id);
        tracing::debug!(url = %url, "GET final message");

        let request = self.client.get(&url).timeout(self.poll_timeout);
        self.send(request, &url).await
    }

    async fn status(&self, job_id: &JobId) -> Result<serde_json::Value> {
        let url = self.endpoints.status(job_id);
        let request = self.client.get(&url).timeout(self.poll_timeout);
        self.send(request, &url).await
    }

    async fn delete_project(&self, project_id: &str) -> Result<serde_json::Value> {
        let url = self.endpoints.project(project_id);
        let request = self.client.delete(&url).timeout(self.submit_timeout);
        self.send(request, &url).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> CourierError {
    if e.is_timeout() {
        ExportApiError::Timeout(format!("{url}: {e}")).into()
    } else {
        ExportApiError::ConnectionFailed(format!("{url}: {e}")).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_base_url_rejected() {
        let err = HttpExportApi::new("  ", &ExportApiConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, CourierError::Configuration(_)));
    }

    #[test]
    fn test_endpoints_normalized() {
        let api = HttpExportApi::new("http://engine:9500/", &ExportApiConfig::default()).unwrap();
        assert_eq!(api.endpoints().export(), "http://engine:9500/export");
        assert_eq!(api.base_url(), "http://engine:9500/");
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_failed() {
        let config = ExportApiConfig {
            submit_timeout_seconds: 2,
            poll_timeout_seconds: 2,
            ..Default::default()
        };
        let api = HttpExportApi::new("http://127.0.0.1:1", &config).unwrap();
        let err = api.status(&JobId::new("J1").unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            CourierError::ExportApi(ExportApiError::ConnectionFailed(_))
                | CourierError::ExportApi(ExportApiError::Timeout(_))
        ));
    }
}
