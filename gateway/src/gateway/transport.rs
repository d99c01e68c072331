//! Outbound calls to external model services.

use async_trait::async_trait;
use jobmatch_common::ServiceRequest;
use reqwest::Client;
use thiserror::Error;

use super::outcome::FailureKind;

/// Errors from a single outbound attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {endpoint}: {message}")]
    ConnectionFailed { endpoint: String, message: String },
    #[error("Request to {endpoint} timed out")]
    TimedOut { endpoint: String },
    #[error("Service returned HTTP {status}")]
    NonSuccessStatus { status: u16 },
    #[error("Service returned a body that is not JSON: {0}")]
    InvalidBody(String),
}

impl TransportError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransportError::ConnectionFailed { .. } => FailureKind::ConnectionRefused,
            TransportError::TimedOut { .. } => FailureKind::Timeout,
            TransportError::NonSuccessStatus { .. } => FailureKind::NonSuccessStatus,
            TransportError::InvalidBody(_) => FailureKind::InvalidResponseSchema,
        }
    }
}

/// Sends one request to an external service and returns its JSON body.
///
/// Implementations must be cancel-safe: the dispatcher drops the future when
/// the deadline elapses.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    async fn call(
        &self,
        endpoint: &str,
        request: &ServiceRequest,
    ) -> Result<serde_json::Value, TransportError>;
}

/// HTTP POST transport backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ServiceTransport for HttpTransport {
    async fn call(
        &self,
        endpoint: &str,
        request: &ServiceRequest,
    ) -> Result<serde_json::Value, TransportError> {
        tracing::debug!("POST {} ({})", endpoint, request.kind());

        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::NonSuccessStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(endpoint, e))?;
        serde_json::from_slice(&body).map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

fn classify(endpoint: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut {
            endpoint: endpoint.to_string(),
        }
    } else {
        TransportError::ConnectionFailed {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_common::ParseResumeRequest;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ServiceRequest {
        ServiceRequest::ParseResume(ParseResumeRequest {
            resume_text: "Rust, 4 years".to_string(),
            resume_format: None,
        })
    }

    #[tokio::test]
    async fn test_posts_request_body_and_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse"))
            .and(body_partial_json(json!({ "resume_text": "Rust, 4 years" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new();
        let body = transport
            .call(&format!("{}/parse", server.uri()), &request())
            .await
            .unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .call(&server.uri(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NonSuccessStatus { status: 503 }));
        assert_eq!(err.failure_kind(), FailureKind::NonSuccessStatus);
    }

    #[tokio::test]
    async fn test_non_json_body_is_schema_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .call(&server.uri(), &request())
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::InvalidResponseSchema);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_failure() {
        // Port 9 (discard) is closed on test machines.
        let err = HttpTransport::new()
            .call("http://127.0.0.1:9/parse", &request())
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::ConnectionRefused);
    }
}
