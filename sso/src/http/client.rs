//! HTTP request helper shared by the token exchange and the Graph calls.

use std::time::Duration;

use hyper::ext::ReasonPhrase;
use log::*;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::redirect::Policy;
use serde::Serialize;

use crate::error::{status_error, Error, ErrorKind, HttpErrorKind};

/// Reason phrase used when a status code has no canonical one.
const UNKNOWN_STATUS: &str = "Unknown Status";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout, covering connect and body transfer.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            user_agent: format!("aad-sso/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Executes single requests and normalizes the outcome into a body or an [`Error`].
///
/// Redirects are never followed, so any 3xx is reported as the terminal status.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client with default configuration.
    pub fn new() -> Result<Self, Error> {
        HttpClientBuilder::new().build()
    }

    /// GET `url` with an `Authorization: Bearer` header and optional query parameters.
    pub async fn get(
        &self,
        url: &str,
        bearer_token: &str,
        query: &[(&str, &str)],
    ) -> Result<String, Error> {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer_token))
            .map_err(|e| {
                warn!("Failed to create auth header: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Http(HttpErrorKind::Transport),
                }
            })?;
        auth_value.set_sensitive(true);

        let mut request = self.client.get(url).header(AUTHORIZATION, auth_value);
        if !query.is_empty() {
            request = request.query(query);
        }

        debug!("GET {}", url);
        self.execute(url, request).await
    }

    /// POST `form` as an `application/x-www-form-urlencoded` body.
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
    ) -> Result<String, Error> {
        debug!("POST {}", url);
        self.execute(url, self.client.post(url).form(form)).await
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> Result<String, Error> {
        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {:?}", url, e);
            Error::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = reason_phrase(&response);
            warn!("Request to {} returned {} {}", url, status.as_u16(), message);
            return Err(status_error(status.as_u16(), &message));
        }

        response.text().await.map_err(|e| {
            warn!("Failed to read response body from {}: {:?}", url, e);
            Error::from(e)
        })
    }
}

/// Reason phrase from the status line, falling back to the canonical phrase for the code.
///
/// hyper only records the phrase when the server sent one that differs from the canonical text.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or(UNKNOWN_STATUS)
            .to_string(),
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<HttpClient, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent)
            .redirect(Policy::none())
            .build()?;

        Ok(HttpClient { client })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_with_timeout(timeout: Duration) -> HttpClient {
        HttpClientBuilder::new()
            .with_timeout(timeout)
            .build()
            .expect("client builds")
    }

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(3));
        assert!(builder.config.user_agent.starts_with("aad-sso/"));
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = HttpClientBuilder::new().with_timeout(Duration::from_millis(500));
        assert_eq!(builder.config.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/me")
            .match_header("authorization", "Bearer token-123")
            .match_header("user-agent", Matcher::Regex("^aad-sso/".to_string()))
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .get(&format!("{}/me", server.url()), "token-123", &[])
            .await
            .unwrap();

        assert_eq!(body, r#"{"id":"1"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_appends_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/me/memberOf")
            .match_query(Matcher::UrlEncoded("$top".into(), "5".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        client
            .get(
                &format!("{}/me/memberOf", server.url()),
                "t",
                &[("$top", "5")],
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_form_encodes_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("a".into(), "1 2".into()),
                Matcher::UrlEncoded("b".into(), "x&y".into()),
            ]))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .post_form(
                &format!("{}/token", server.url()),
                &[("a", "1 2"), ("b", "x&y")],
            )
            .await
            .unwrap();

        assert_eq!(body, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/me")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get(&format!("{}/me", server.url()), "t", &[])
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Http(HttpErrorKind::Status {
                code: 503,
                message: "Service Unavailable".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_status_error_uses_server_reason_phrase() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 401 Token Expired\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let client = HttpClient::new().unwrap();
        let err = client
            .get(&format!("http://{}/me", addr), "t", &[])
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Http(HttpErrorKind::Status {
                code: 401,
                message: "Token Expired".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let mut server = Server::new_async().await;
        let _redirect = server
            .mock("GET", "/me")
            .with_status(302)
            .with_header("location", "/elsewhere")
            .create_async()
            .await;
        let target = server
            .mock("GET", "/elsewhere")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get(&format!("{}/me", server.url()), "t", &[])
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(302));
        target.assert_async().await;
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/me")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(2));
                w.write_all(b"{}")
            })
            .create_async()
            .await;

        let client = client_with_timeout(Duration::from_millis(200));
        let err = client
            .get(&format!("{}/me", server.url()), "t", &[])
            .await
            .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::Http(HttpErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = HttpClient::new().unwrap();
        // Port 1 on loopback is never listening in the test environment.
        let err = client
            .get("http://127.0.0.1:1/me", "t", &[])
            .await
            .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::Http(HttpErrorKind::Transport));
    }
}
