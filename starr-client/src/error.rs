//! Shared client error types
//!
//! Every failure surfaced by the request layer is a [`StarrError`]. Variants
//! fall into five groups: usage errors (`NilClient`, `NilOutput`), transport
//! errors, remote status errors, decode errors and authentication errors.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Maximum response body size read by the client (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

pub type Result<T, E = StarrError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StarrError {
    #[error("HTTP client is not configured")]
    NilClient,

    #[error("no output target provided for response from {url}")]
    NilOutput { url: String },

    #[error("{operation} {url}: request failed: {source}")]
    Transport {
        operation: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url}: HTTP error {status}{}", message_suffix(.message))]
    Status {
        method: String,
        url: String,
        status: StatusCode,
        body: String,
        message: Option<String>,
        location: Option<String>,
    },

    #[error("encoding request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("authenticating as user '{username}' failed")]
    Auth {
        username: String,
        #[source]
        source: Option<Box<StarrError>>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Response too large ({size} bytes, max {MAX_RESPONSE_SIZE}) from {url}")]
    ResponseTooLarge { url: String, size: u64 },
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl StarrError {
    /// HTTP status carried by a remote status error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Usage errors indicate a bug in the calling code rather than a remote fault.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::NilClient | Self::NilOutput { .. })
    }

    pub(crate) fn auth(username: &str, source: Option<Self>) -> Self {
        Self::Auth {
            username: username.to_string(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn transport(operation: impl ToString, url: impl ToString, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.to_string(),
            url: url.to_string(),
            source,
        }
    }
}

/// Error payloads returned by the *arr APIs.
///
/// Failures come back either as `{"message": "..", "description": ".."}` or,
/// for validation errors, as an array of `{"propertyName", "errorMessage"}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Message {
        message: String,
        #[serde(default)]
        description: Option<String>,
    },
    Validation(Vec<ValidationFailure>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidationFailure {
    #[serde(default)]
    property_name: String,
    error_message: String,
}

/// Best-effort extraction of the server's error message from a response body.
pub(crate) fn parse_error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body).ok()? {
        ErrorBody::Message {
            message,
            description: Some(description),
        } if !description.is_empty() => Some(format!("{message} ({description})")),
        ErrorBody::Message { message, .. } => Some(message),
        ErrorBody::Validation(failures) if failures.is_empty() => None,
        ErrorBody::Validation(failures) => Some(
            failures
                .iter()
                .map(|f| {
                    if f.property_name.is_empty() {
                        f.error_message.clone()
                    } else {
                        format!("{}: {}", f.property_name, f.error_message)
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
    }
}

// Serialization on the request side; response decoding carries its URL and
// builds `Decode` directly.
impl From<serde_json::Error> for StarrError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for StarrError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode, message: Option<&str>) -> StarrError {
        StarrError::Status {
            method: "GET".to_string(),
            url: "http://short.zz/api/v3/series".to_string(),
            status,
            body: String::new(),
            message: message.map(str::to_string),
            location: None,
        }
    }

    #[test]
    fn test_error_display_status() {
        let err = status_error(StatusCode::NOT_FOUND, None);
        assert_eq!(
            err.to_string(),
            "GET http://short.zz/api/v3/series: HTTP error 404 Not Found"
        );

        let err = status_error(StatusCode::BAD_REQUEST, Some("bad series id"));
        assert_eq!(
            err.to_string(),
            "GET http://short.zz/api/v3/series: HTTP error 400 Bad Request: bad series id"
        );
    }

    #[test]
    fn test_status_helpers() {
        assert!(status_error(StatusCode::NOT_FOUND, None).is_not_found());
        assert!(status_error(StatusCode::UNAUTHORIZED, None).is_unauthorized());
        assert!(!status_error(StatusCode::UNAUTHORIZED, None).is_not_found());
        assert_eq!(StarrError::NilClient.status(), None);
    }

    #[test]
    fn test_usage_errors() {
        assert!(StarrError::NilClient.is_usage());
        assert!(StarrError::NilOutput { url: String::new() }.is_usage());
        assert!(!status_error(StatusCode::BAD_GATEWAY, None).is_usage());
    }

    #[test]
    fn test_serde_json_error_is_encode() {
        let err: StarrError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, StarrError::Encode(_)));
        assert!(err.to_string().starts_with("encoding request body"));
    }

    #[test]
    fn test_error_display_auth() {
        let err = StarrError::auth("admin", None);
        assert_eq!(err.to_string(), "authenticating as user 'admin' failed");
    }

    #[test]
    fn test_error_display_response_too_large() {
        let err = StarrError::ResponseTooLarge {
            url: "http://short.zz".to_string(),
            size: 20_000_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("20000000"));
        assert!(msg.contains(&MAX_RESPONSE_SIZE.to_string()));
    }

    #[test]
    fn test_parse_error_message_object() {
        let body = r#"{"message":"NotFound","description":"Series 12 does not exist"}"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("NotFound (Series 12 does not exist)")
        );
        assert_eq!(
            parse_error_message(r#"{"message":"Unauthorized"}"#).as_deref(),
            Some("Unauthorized")
        );
    }

    #[test]
    fn test_parse_error_message_validation() {
        let body = r#"[{"propertyName":"Path","errorMessage":"Path is required"},{"errorMessage":"Invalid"}]"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("Path: Path is required; Invalid")
        );
    }

    #[test]
    fn test_parse_error_message_unparsable() {
        assert_eq!(parse_error_message("<html>nope</html>"), None);
        assert_eq!(parse_error_message("[]"), None);
    }

    #[test]
    fn test_max_response_size() {
        assert_eq!(MAX_RESPONSE_SIZE, 16 * 1024 * 1024);
    }
}
