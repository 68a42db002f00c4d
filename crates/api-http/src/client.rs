//! `reqwest` implementation of `ApiClient`.

use std::collections::HashMap;

use async_trait::async_trait;
use dxfs_api::{ApiClient, ApiError, ApiSettings};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use tracing::debug;

use crate::error::HttpError;

/// ApiClient implementation using `reqwest`.
///
/// Connection pooling is handled by the inner client. Nothing here retries or
/// sets a request timeout; a call either completes or fails once.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    /// The underlying HTTP client.
    http: Client,
    /// API server location and credentials.
    settings: ApiSettings,
}

impl HttpApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `settings` - API server location and credentials
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        settings.validate()?;
        let http: Client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { http, settings })
    }
}

/// Turn a response into its body, or an error for non-success statuses.
async fn read_body(url: &str, response: Response) -> Result<Vec<u8>, ApiError> {
    let status: reqwest::StatusCode = response.status();
    if !status.is_success() {
        let message: String = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| HttpError::request(url, e))?;
    Ok(body.to_vec())
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn call_api(
        &self,
        route: &str,
        payload: &serde_json::Value,
    ) -> Result<Vec<u8>, ApiError> {
        let url: String = self.settings.api_url(route);
        debug!(url = %url, "API call");

        let response: Response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.settings.authorization())
            .json(payload)
            .send()
            .await
            .map_err(|e| HttpError::request(&url, e))?;

        read_body(&url, response).await
    }

    async fn http_get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        let mut request = self.http.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response: Response = request
            .send()
            .await
            .map_err(|e| HttpError::request(url, e))?;

        read_body(url, response).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;

    fn test_settings(port: u16) -> ApiSettings {
        ApiSettings::default()
            .with_server("http", "127.0.0.1", port)
            .with_token("test-token")
    }

    /// Serve exactly one request with a canned response.
    ///
    /// Returns the bound port and a receiver yielding the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (u16, oneshot::Receiver<String>) {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw: Vec<u8> = Vec::new();
            let mut buf: [u8; 4096] = [0u8; 4096];

            // Headers, then as much body as Content-Length announces.
            let header_end: usize = loop {
                let n: usize = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                if n == 0 {
                    break raw.len();
                }
            };
            let head: String = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
            let content_length: usize = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            while raw.len() < header_end + content_length {
                let n: usize = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let response: String = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
        });

        (port, rx)
    }

    #[test]
    fn test_new_rejects_missing_token() {
        let err: ApiError = HttpApiClient::new(ApiSettings::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_http_get_sends_headers_and_returns_body() {
        let (port, request) = serve_once("HTTP/1.1 206 Partial Content", "hello").await;
        let client: HttpApiClient = HttpApiClient::new(test_settings(port)).unwrap();

        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert("Range".into(), "bytes=0-4".into());
        headers.insert("X-Signature".into(), "abc".into());

        let url: String = format!("http://127.0.0.1:{}/F/obj/project-1", port);
        let body: Vec<u8> = client.http_get(&url, &headers).await.unwrap();
        assert_eq!(body, b"hello");

        let raw: String = request.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /f/obj/project-1 "));
        assert!(raw.contains("range: bytes=0-4"));
        assert!(raw.contains("x-signature: abc"));
        // Pre-signed GETs never carry platform credentials.
        assert!(!raw.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_http_get_error_status() {
        let (port, _request) = serve_once("HTTP/1.1 403 Forbidden", "expired").await;
        let client: HttpApiClient = HttpApiClient::new(test_settings(port)).unwrap();

        let url: String = format!("http://127.0.0.1:{}/F/obj", port);
        let err: ApiError = client.http_get(&url, &HashMap::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_call_api_posts_json_with_auth() {
        let (port, request) =
            serve_once("HTTP/1.1 200 OK", r#"{"url": "https://dl", "headers": {}}"#).await;
        let client: HttpApiClient = HttpApiClient::new(test_settings(port)).unwrap();

        let payload: serde_json::Value =
            serde_json::json!({"project": "project-1", "duration": 10});
        let body: Vec<u8> = client.call_api("file-1/download", &payload).await.unwrap();
        assert_eq!(body, br#"{"url": "https://dl", "headers": {}}"#);

        let raw: String = request.await.unwrap();
        let lower: String = raw.to_lowercase();
        assert!(lower.starts_with("post /file-1/download "));
        assert!(lower.contains("authorization: bearer test-token"));
        assert!(lower.contains("content-type: application/json"));
        assert!(raw.contains(r#""project":"project-1""#));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let port: u16 = {
            let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client: HttpApiClient = HttpApiClient::new(test_settings(port)).unwrap();

        let url: String = format!("http://127.0.0.1:{}/x", port);
        let err: ApiError = client.http_get(&url, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
    }
}
