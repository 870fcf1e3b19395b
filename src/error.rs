//! Error taxonomy for a logical send.
//!
//! Every failure inside the dispatch pipeline (payload encoding, encryption,
//! transport) is converted into one of these five kinds before it leaves the
//! [`Dispatcher`](crate::dispatch::Dispatcher). Display strings are meant to
//! be shown to a user as-is.

use thiserror::Error;

/// Generic marker used when a failure response body is not decodable text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Failure kinds surfaced by the dispatch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The target's base URL (or the request URL built from it) is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with something that is not a usable HTTP response.
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// The server rejected the push (any status other than 200), or the
    /// request never reached it.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Key derivation or the cipher step failed.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The caller asked to dispatch to an empty target set.
    #[error("No targets selected: select at least one target")]
    NoTargetsSelected,
}

impl DispatchError {
    /// Returns `true` for caller usage errors that never touched the network.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::NoTargetsSelected)
    }

    /// Short machine-friendly name of the kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidResponse(_) => "invalid_response",
            Self::RequestFailed(_) => "request_failed",
            Self::EncryptionFailed(_) => "encryption_failed",
            Self::NoTargetsSelected => "no_targets_selected",
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    /// Classifies a client-side reqwest failure.
    ///
    /// Builder errors mean the URL could not be turned into a request, decode
    /// and body errors mean the response was unusable, and anything else
    /// (connect, timeout, TLS) is reported as a failed request.
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_decode() || err.is_body() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_human_readable() {
        assert_eq!(
            DispatchError::RequestFailed("device token invalid".to_string()).to_string(),
            "Request failed: device token invalid"
        );
        assert_eq!(
            DispatchError::NoTargetsSelected.to_string(),
            "No targets selected: select at least one target"
        );
    }

    #[test]
    fn test_only_no_targets_is_usage_error() {
        assert!(DispatchError::NoTargetsSelected.is_usage_error());
        assert!(!DispatchError::InvalidUrl("x".to_string()).is_usage_error());
        assert!(!DispatchError::RequestFailed("x".to_string()).is_usage_error());
        assert!(!DispatchError::EncryptionFailed("x".to_string()).is_usage_error());
        assert!(!DispatchError::InvalidResponse("x".to_string()).is_usage_error());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DispatchError::InvalidUrl(String::new()).kind(), "invalid_url");
        assert_eq!(DispatchError::NoTargetsSelected.kind(), "no_targets_selected");
    }
}
