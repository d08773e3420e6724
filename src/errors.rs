use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Errors that abort a request.
///
/// Lost records and failed distance chunks shrink the result set and are
/// logged; they never become an `AppError`.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Missing or empty required input (e.g. the address).
    InvalidRequest(String),
    /// The geocoder found no match for the address.
    AddressNotFound(String),
    /// Network/HTTP failure from the record store or the mapping service.
    UpstreamUnavailable(String),
    /// Internal server error.
    Internal(String),
    /// A fatal error tagged with the pipeline step that raised it.
    WithContext {
        source: Box<AppError>,
        context: String,
    },
}

impl AppError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            AppError::AddressNotFound(msg) => write!(f, "Address not found: {}", msg),
            AppError::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and a JSON body.
    ///
    /// Upstream and internal messages are logged but replaced with a generic
    /// message in the body so no credential or URL detail leaks out.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AddressNotFound(msg) => {
                tracing::info!("Address not found: {}", msg);
                (StatusCode::NOT_FOUND, "address not found".to_string())
            }
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!("Upstream unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "External service unavailable".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (**source).clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // without_url drops the query string, which carries the access token
        AppError::UpstreamUnavailable(err.without_url().to_string())
    }
}

/// Failure modes of a single geocoding call.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// The mapping service answered but returned zero usable candidates.
    NotFound,
    /// Network, HTTP or decoding failure; also used when the breaker is open.
    ServiceUnavailable(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::NotFound => write!(f, "no geocoding candidates"),
            GeocodeError::ServiceUnavailable(msg) => {
                write!(f, "geocoding service unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for GeocodeError {}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound => {
                AppError::AddressNotFound("the address could not be resolved".to_string())
            }
            GeocodeError::ServiceUnavailable(msg) => AppError::UpstreamUnavailable(msg),
        }
    }
}

/// Tags a failed pipeline step with what it was doing; the HTTP status
/// still comes from the root error.
pub trait ResultExt<T> {
    fn context(self, step: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, step: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|source| AppError::WithContext {
            source: Box::new(source),
            context: step.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::AddressNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::UpstreamUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_context_delegates_status() {
        let err: Result<(), AppError> = Err(AppError::AddressNotFound("calle".into()));
        let wrapped = err.context("geocoding origin").unwrap_err();

        assert!(matches!(wrapped.root(), AppError::AddressNotFound(_)));
        assert_eq!(wrapped.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_geocode_error_conversion() {
        assert!(matches!(
            AppError::from(GeocodeError::NotFound),
            AppError::AddressNotFound(_)
        ));
        assert!(matches!(
            AppError::from(GeocodeError::ServiceUnavailable("timeout".into())),
            AppError::UpstreamUnavailable(_)
        ));
    }
}
