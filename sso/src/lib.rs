//! # sso
//!
//! Azure AD (Microsoft identity platform) single sign-on over the OAuth 2.0
//! authorization code flow:
//! - Authorization URL generation with a caller-owned CSRF state
//! - Authorization code exchange
//! - Profile and group membership lookup on Microsoft Graph
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sso::{CallbackParams, SsoClient};
//!
//! let mut client = SsoClient::new(redirect_url, tenant, application_id, secret)?;
//! let url = client.authorization_url(&state);
//! // ... user signs in and is redirected back ...
//! client.authorize(&CallbackParams::from_url(&callback_url)?, &state).await?;
//! let profile = client.me().await?;
//! ```

pub mod callback;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use callback::{CallbackParams, ProviderError};
pub use client::{SsoClient, SsoSettings, TokenResponse};
pub use endpoints::Endpoints;
pub use error::{Error, ErrorKind};
