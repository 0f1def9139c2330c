//! HTTP transport behind an injectable seam

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("connection timeout")]
    Timeout,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// An outbound request, described independently of the HTTP stack.
///
/// The bearer token is attached by the call wrapper, not by the code that
/// builds the request; requests are `Clone` so the wrapper can reissue one
/// verbatim after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured API root, e.g. `data/files`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart { file_name: String, content: Bytes },
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::default(),
            bearer: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Multipart file upload under the platform's `file` form field.
    pub fn multipart(mut self, file_name: impl Into<String>, content: Bytes) -> Self {
        self.body = RequestBody::Multipart {
            file_name: file_name.into(),
            content,
        };
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text for error reporting, truncated to keep logs readable.
    pub fn text_lossy(&self) -> String {
        const MAX: usize = 512;
        let text = String::from_utf8_lossy(&self.body);
        if text.chars().count() > MAX {
            let truncated: String = text.chars().take(MAX).collect();
            format!("{truncated}...")
        } else {
            text.into_owned()
        }
    }
}

/// The single seam between the client and the network. Tests implement
/// this with scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            // Result downloads can be large; the request timeout covers the
            // whole body read.
            request_timeout: Duration::from_secs(300),
            user_agent: format!("genoflow/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed transport against a fixed API root.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.base_url, request.path);
        debug!(method = %request.method, url, "issuing request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { file_name, content } => {
                let part = Part::bytes(content.to_vec()).file_name(file_name);
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_builder() {
                TransportError::InvalidUrl(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        debug!(status = %status, size = body.len(), "response received");

        Ok(ApiResponse {
            status,
            content_disposition,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_settings_defaults() {
        let settings = HttpSettings::default();
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(300));
        assert!(settings.user_agent.starts_with("genoflow/"));
    }

    #[test]
    fn test_request_builder_accumulates_query() {
        let request = ApiRequest::get("data/files")
            .query("file", "sample.vcf")
            .query("page", 2);

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "data/files");
        assert_eq!(
            request.query,
            vec![
                ("file".to_string(), "sample.vcf".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert!(request.bearer.is_none());
    }

    #[test]
    fn test_text_lossy_truncates_long_bodies() {
        let response = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            content_disposition: None,
            body: Bytes::from(vec![b'x'; 2048]),
        };
        assert!(response.text_lossy().len() < 600);
    }
}
