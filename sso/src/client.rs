//! Azure AD authorization code flow client.
//!
//! Builds the sign-in URL, exchanges the returned authorization code for an
//! access token and reads the signed-in user's profile and group memberships
//! from Microsoft Graph using that token.

use std::time::Duration;

use log::*;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::callback::CallbackParams;
use crate::endpoints::{Endpoints, SCOPE};
use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::http::{HttpClient, HttpClientBuilder};

/// Everything needed to construct an [`SsoClient`].
#[derive(Debug, Clone)]
pub struct SsoSettings {
    /// Callback URL registered with the application.
    pub redirect_url: String,
    /// Directory instance, e.g. `contoso.com` or a tenant GUID.
    pub tenant: String,
    /// Application (client) ID.
    pub application_id: String,
    /// Client secret value.
    pub application_secret: SecretString,
    pub endpoints: Endpoints,
    pub timeout: Duration,
}

/// OAuth token response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: SecretString,
    /// Lifetime in seconds; v1 and AD FS endpoints send it as a string.
    #[serde(default, deserialize_with = "seconds")]
    pub expires_in: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub refresh_token: Option<SecretString>,
    #[serde(default, deserialize_with = "lenient")]
    pub id_token: Option<SecretString>,
}

/// Optional token fields never fail the exchange; a value of the wrong type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Form body posted to the token endpoint.
#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Single sign-on client for one authorization cycle.
///
/// Starts unauthenticated; a successful [`SsoClient::authorize`] stores the access
/// token that [`SsoClient::me`] and [`SsoClient::groups`] send as a bearer credential.
/// Use one instance per in-flight sign-in.
#[derive(Debug)]
pub struct SsoClient {
    redirect_url: String,
    tenant: String,
    application_id: String,
    application_secret: SecretString,
    access_token: Option<SecretString>,
    endpoints: Endpoints,
    http: HttpClient,
}

impl SsoClient {
    /// Create a client against the public Azure endpoints with default HTTP settings.
    pub fn new(
        redirect_url: &str,
        tenant: &str,
        application_id: &str,
        application_secret: SecretString,
    ) -> Result<Self, Error> {
        Ok(Self {
            redirect_url: redirect_url.to_string(),
            tenant: tenant.to_string(),
            application_id: application_id.to_string(),
            application_secret,
            access_token: None,
            endpoints: Endpoints::default(),
            http: HttpClient::new()?,
        })
    }

    pub fn from_settings(settings: &SsoSettings) -> Result<Self, Error> {
        let http = HttpClientBuilder::new()
            .with_timeout(settings.timeout)
            .build()?;

        Ok(Self::new(
            &settings.redirect_url,
            &settings.tenant,
            &settings.application_id,
            settings.application_secret.clone(),
        )?
        .with_endpoints(settings.endpoints.clone())
        .with_http_client(http))
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_client(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }

    /// Generate the URL to send the user's browser to for sign-in.
    ///
    /// `state` is echoed back on the callback and must be checked in [`SsoClient::authorize`].
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?\
            response_type=code&\
            redirect_uri={}&\
            client_id={}&\
            response_mode=query&\
            scope={}&\
            state={}",
            self.endpoints.authorize_url(&self.tenant),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(&self.application_id),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state)
        )
    }

    /// Validate the callback and exchange its code for an access token.
    ///
    /// The code is checked before the state. On failure the client keeps whatever
    /// token it held before.
    pub async fn authorize(
        &mut self,
        callback: &CallbackParams,
        expected_state: &str,
    ) -> Result<(), Error> {
        let code = match callback.code.as_deref() {
            Some(code) if !code.is_empty() => code,
            _ => {
                warn!("Authorization callback without code");
                return Err(match &callback.provider_error {
                    Some(provider_error) => Error {
                        source: Some(Box::new(provider_error.clone())),
                        error_kind: ErrorKind::OAuth(OAuthErrorKind::MissingCode),
                    },
                    None => oauth_error(
                        OAuthErrorKind::MissingCode,
                        "Expected \"code\" in callback parameters",
                    ),
                });
            }
        };

        if callback.state.as_deref() != Some(expected_state) {
            warn!("Authorization callback state does not match the session state");
            return Err(oauth_error(
                OAuthErrorKind::CsrfMismatch,
                "Invalid \"state\" (CSRF)",
            ));
        }

        let tokens = self.exchange_code(code).await?;
        self.access_token = Some(tokens.access_token);
        info!("Authorized against tenant {}", self.tenant);
        Ok(())
    }

    /// Exchange an authorization code for tokens without touching the client's state.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            grant_type: "authorization_code",
            client_id: &self.application_id,
            client_secret: self.application_secret.expose_secret(),
            scope: SCOPE,
            code,
            redirect_uri: &self.redirect_url,
        };

        debug!("Exchanging authorization code for tokens");

        let body = self
            .http
            .post_form(&self.endpoints.token_url(&self.tenant), &request)
            .await?;

        let value = parse_json(&body)?;
        let tokens: TokenResponse = serde_json::from_value(value).map_err(|e| {
            warn!("Token response is missing required fields: {}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })?;

        debug!("Received {} token", tokens.token_type);
        Ok(tokens)
    }

    /// Current user's profile, passed through as returned by Graph.
    pub async fn me(&self) -> Result<serde_json::Value, Error> {
        self.graph_get(&self.endpoints.me_url()).await
    }

    /// Groups and directory roles the current user is a direct member of.
    ///
    /// Graph only answers this when the application has been granted
    /// `Group.Read.All` (admin consent); otherwise the refusal surfaces as an HTTP error.
    pub async fn groups(&self) -> Result<serde_json::Value, Error> {
        self.graph_get(&self.endpoints.member_of_url()).await
    }

    async fn graph_get(&self, url: &str) -> Result<serde_json::Value, Error> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            oauth_error(OAuthErrorKind::NotAuthorized, "No access token available")
        })?;

        let body = self.http.get(url, token.expose_secret(), &[]).await?;
        parse_json(&body)
    }
}

/// Parse a response body; only a JSON object or array counts as data.
fn parse_json(body: &str) -> Result<serde_json::Value, Error> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        warn!("Failed to parse response body: {}", e);
        Error::from(e)
    })?;

    if !(value.is_object() || value.is_array()) {
        warn!("Response body is not an object or array");
        return Err(oauth_error(
            OAuthErrorKind::InvalidResponse,
            "Response body is not an object or array",
        ));
    }

    Ok(value)
}
