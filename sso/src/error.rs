//! Error types for the `sso` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the sso crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in sso.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Http(HttpErrorKind),
}

/// Errors from the authorization code flow itself.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The callback carried no authorization code.
    MissingCode,
    /// The callback `state` differs from the one the session started with.
    CsrfMismatch,
    /// A response body was absent, unparseable, or missing required fields.
    InvalidResponse,
    /// A Graph call was attempted before a token was obtained.
    NotAuthorized,
    /// The callback URL could not be parsed.
    InvalidCallback,
}

/// Errors from HTTP requests.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    /// Connection could not be established (DNS, TCP, TLS) or the transfer failed.
    Transport,
    /// The request exceeded the configured timeout.
    Timeout,
    /// The server answered with a status outside 200..=299.
    Status { code: u16, message: String },
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// HTTP status code when the error is a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match &self.error_kind {
            ErrorKind::Http(HttpErrorKind::Status { code, .. }) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Http(HttpErrorKind::Status { code, message }) => {
                write!(f, "HTTP error: {} {}", code, message)?
            }
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else {
            ErrorKind::Http(HttpErrorKind::Transport)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidCallback),
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create errors for non-2xx responses.
pub fn status_error(code: u16, message: &str) -> Error {
    Error {
        source: None,
        error_kind: ErrorKind::Http(HttpErrorKind::Status {
            code,
            message: message.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_only_for_status_errors() {
        let err = status_error(401, "Unauthorized");
        assert_eq!(err.status_code(), Some(401));

        let err = oauth_error(OAuthErrorKind::NotAuthorized, "no token");
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_display_includes_status_and_reason() {
        let err = status_error(403, "Forbidden");
        assert_eq!(err.to_string(), "HTTP error: 403 Forbidden");
    }

    #[test]
    fn test_display_includes_source_message() {
        let err = oauth_error(OAuthErrorKind::CsrfMismatch, "state does not match");
        assert_eq!(
            err.to_string(),
            "OAuth error: CsrfMismatch (state does not match)"
        );
    }

    #[test]
    fn test_serde_error_maps_to_invalid_response() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::InvalidResponse)
        );
        assert!(err.source().is_some());
    }
}
