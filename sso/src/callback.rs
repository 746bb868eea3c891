//! Parameters delivered to the redirect URL after the user signs in.

use std::fmt;

use url::{form_urlencoded, Url};

use crate::error::Error;

/// Error reported by the identity provider on the callback, e.g. when the user declines consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub error: String,
    pub description: Option<String>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {}

/// Authorization code and state taken from the inbound callback request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub provider_error: Option<ProviderError>,
}

impl CallbackParams {
    pub fn new(code: Option<String>, state: Option<String>) -> Self {
        Self {
            code,
            state,
            provider_error: None,
        }
    }

    /// Parse a query string such as `code=abc&state=xyz`. A leading `?` is ignored and
    /// the first occurrence of a repeated key wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut description = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "code" => &mut code,
                "state" => &mut state,
                "error" => &mut error,
                "error_description" => &mut description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            code,
            state,
            provider_error: error.map(|error| ProviderError { error, description }),
        }
    }

    /// Parse the full URL the provider redirected the browser to.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }
}
