use thiserror::Error;

use crate::request::RequestKind;

/// Terminal outcome of a single provider call that did not produce a report.
///
/// Every variant renders as a single user-facing line.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("{kind} forecasts are not available from {provider}")]
    UnsupportedRequest { kind: RequestKind, provider: String },

    #[error("{}", network_message(cause, location))]
    NetworkError {
        location: String,
        cause: NetworkCause,
    },

    /// The provider answered successfully but the body did not have the expected shape.
    #[error("Network error: {status}")]
    DecodeError {
        status: u16,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a call ended in [`Failure::NetworkError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCause {
    /// The provider answered with a non-2xx status.
    Status(u16),
    /// A lookup step matched nothing, so there is nothing to forecast.
    NoMatch,
    /// The request never produced an HTTP response.
    Unreachable(String),
}

impl Failure {
    pub fn http_status(location: &str, status: u16) -> Self {
        Failure::NetworkError {
            location: location.to_string(),
            cause: NetworkCause::Status(status),
        }
    }

    /// HTTP status attached to this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Failure::NetworkError {
                cause: NetworkCause::Status(status),
                ..
            }
            | Failure::DecodeError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Failure::NetworkError { cause, .. } => {
                matches!(cause, NetworkCause::Status(404) | NetworkCause::NoMatch)
            }
            _ => false,
        }
    }
}

fn network_message(cause: &NetworkCause, location: &str) -> String {
    match cause {
        NetworkCause::Status(404) | NetworkCause::NoMatch => {
            format!("No forecast available for \"{location}\"")
        }
        NetworkCause::Status(status) => format!("Network error: {status}"),
        NetworkCause::Unreachable(message) => format!("Network error: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_location() {
        let failure = Failure::http_status("84093", 404);
        assert_eq!(failure.to_string(), "No forecast available for \"84093\"");
        assert!(failure.is_not_found());
        assert_eq!(failure.status_code(), Some(404));
    }

    #[test]
    fn other_statuses_are_generic() {
        let failure = Failure::http_status("84093", 503);
        assert_eq!(failure.to_string(), "Network error: 503");
        assert!(!failure.is_not_found());
    }

    #[test]
    fn empty_lookup_is_not_found_without_a_status() {
        let failure = Failure::NetworkError {
            location: "WeatherUnderground".to_string(),
            cause: NetworkCause::NoMatch,
        };
        assert_eq!(
            failure.to_string(),
            "No forecast available for \"WeatherUnderground\""
        );
        assert!(failure.is_not_found());
        assert_eq!(failure.status_code(), None);
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let failure = Failure::NetworkError {
            location: "84093".to_string(),
            cause: NetworkCause::Unreachable("connection refused".to_string()),
        };
        assert_eq!(failure.to_string(), "Network error: connection refused");
        assert!(!failure.is_not_found());
        assert_eq!(failure.status_code(), None);
    }

    #[test]
    fn decode_error_renders_like_network_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let failure = Failure::DecodeError {
            status: 200,
            location: "Sandy".to_string(),
            source,
        };
        assert_eq!(failure.to_string(), "Network error: 200");
        assert_eq!(failure.status_code(), Some(200));
    }

    #[test]
    fn unsupported_message() {
        let failure = Failure::UnsupportedRequest {
            kind: RequestKind::City,
            provider: "DarkSky".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "City name forecasts are not available from DarkSky"
        );
        assert_eq!(failure.status_code(), None);
    }
}
