//! Identity provider and directory API endpoints.

/// Scopes requested on both the authorization URL and the token exchange.
pub const SCOPE: &str = "openid email profile";

/// Default OAuth2 login host.
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

/// Default Microsoft Graph base URL.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Base URLs for the login host and the Graph API.
///
/// Overridable so tests and sovereign clouds can point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    login_base: String,
    graph_base: String,
}

impl Endpoints {
    pub fn new(login_base: &str, graph_base: &str) -> Self {
        Self {
            login_base: login_base.trim_end_matches('/').to_string(),
            graph_base: graph_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn login_base(&self) -> &str {
        &self.login_base
    }

    pub fn graph_base(&self) -> &str {
        &self.graph_base
    }

    pub fn authorize_url(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.login_base, tenant)
    }

    pub fn token_url(&self, tenant: &str) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_base, tenant)
    }

    pub fn me_url(&self) -> String {
        format!("{}/me", self.graph_base)
    }

    pub fn member_of_url(&self) -> String {
        format!("{}/me/memberOf", self.graph_base)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_BASE_URL, DEFAULT_GRAPH_BASE_URL)
    }
}
