//! Gateway client: every backend call goes through here.
//!
//! Outbound, the request interceptor attaches the stored credential and role.
//! Inbound, the response interceptor classifies failures with
//! [`FailureKind::classify`] and reacts: a 401 anywhere tears the session
//! down, other failures surface a notice and reject the call.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{PortalConfig, DEFAULT_REQUEST_TIMEOUT, LOGIN_ROUTE};
use crate::error::{FailureKind, GatewayError};
use crate::notice::{Notice, Notifier};
use crate::routes::Navigator;
use crate::session::SharedSession;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ROLE_HEADER: &str = "X-Role";

// =============================================================================
// Transport (Infrastructure)
// =============================================================================

/// Request as handed to the transport, headers already injected.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RawRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Failure before any response arrived.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport rooted at the configured API base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method, &url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        // Non-JSON bodies (proxy error pages) are kept as a bare string
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(RawResponse { status, body })
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connect(e.to_string())
    }
}

// =============================================================================
// Requests and responses
// =============================================================================

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// A 404 is an expected answer for this call: reject quietly, no notice.
    pub tolerate_not_found: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            tolerate_not_found: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, GatewayError> {
        let value = serde_json::to_value(body).map_err(|e| GatewayError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn tolerate_not_found(mut self) -> Self {
        self.tolerate_not_found = true;
        self
    }
}

/// Backend response envelope: `{ code, message?, data? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<Envelope<T>, GatewayError> {
        serde_json::from_value(self.body.clone()).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

// =============================================================================
// Gateway client
// =============================================================================

#[derive(Clone)]
pub struct GatewayClient {
    transport: Arc<dyn Transport>,
    session: SharedSession,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SharedSession,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            notifier,
            navigator,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize>(
        &self,
        path: impl Into<String>,
        body: &B,
    ) -> Result<ApiResponse, GatewayError> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// Send a request through both interceptors.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let raw = self.intercept_request(&request);

        let outcome = match tokio::time::timeout(self.timeout, self.transport.send(raw)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout),
        };

        self.intercept_response(&request, outcome)
    }

    fn intercept_request(&self, request: &ApiRequest) -> RawRequest {
        let session = self.session.snapshot();
        let mut headers = Vec::new();

        if !session.credential.is_empty() {
            headers.push((
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", session.credential),
            ));
        }
        if let Some(role) = session.role {
            headers.push((ROLE_HEADER.to_string(), role.as_str().to_string()));
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = session.is_authenticated(),
            "Dispatching request"
        );

        RawRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            headers,
            body: request.body.clone(),
        }
    }

    fn intercept_response(
        &self,
        request: &ApiRequest,
        outcome: Result<RawResponse, TransportError>,
    ) -> Result<ApiResponse, GatewayError> {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path = %request.path, error = %e, "No response received");
                self.notifier.notify(Notice::network_unavailable());
                return Err(GatewayError::NetworkUnavailable(e.to_string()));
            }
        };

        let embedded_code = response.body.get("code").and_then(Value::as_i64);
        let message = response
            .body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        match FailureKind::classify(response.status, embedded_code) {
            None => Ok(ApiResponse {
                status: response.status,
                body: response.body,
            }),
            Some(FailureKind::SessionExpired) => {
                self.force_logout(&request.path);
                Err(GatewayError::SessionExpired)
            }
            Some(FailureKind::NotFound) => {
                if request.tolerate_not_found {
                    tracing::debug!(path = %request.path, "Not found (expected)");
                } else {
                    self.notifier.notify(Notice::request_failed(message.as_deref()));
                }
                Err(GatewayError::NotFound {
                    path: request.path.clone(),
                })
            }
            Some(FailureKind::RequestFailed) => {
                tracing::warn!(path = %request.path, status = response.status, "Request failed");
                self.notifier.notify(Notice::request_failed(message.as_deref()));
                Err(GatewayError::RequestFailed {
                    status: response.status,
                    message,
                })
            }
        }
    }

    /// Global reaction to a 401: clear, go to login, tell the user.
    fn force_logout(&self, path: &str) {
        tracing::warn!(path, "Session rejected by server, forcing logout");
        self.session.clear();
        self.navigator.redirect(LOGIN_ROUTE);
        self.notifier.notify(Notice::session_expired());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_joins_urls() {
        let transport = HttpTransport::new("http://localhost:8080/api/");
        assert_eq!(
            transport.url("/auth/login"),
            "http://localhost:8080/api/auth/login"
        );
        assert_eq!(
            transport.url("student/user/1"),
            "http://localhost:8080/api/student/user/1"
        );
    }

    #[test]
    fn test_envelope_without_data() {
        let response = ApiResponse {
            status: 200,
            body: serde_json::json!({ "code": 500, "message": "Wrong password" }),
        };
        let envelope: Envelope<Value> = response.envelope().unwrap();
        assert!(!envelope.is_success());
        assert_eq!(envelope.message.as_deref(), Some("Wrong password"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_rejects_non_object_body() {
        let response = ApiResponse {
            status: 200,
            body: Value::String("<html>".to_string()),
        };
        assert!(matches!(
            response.envelope::<Value>(),
            Err(GatewayError::Decode(_))
        ));
    }
}
