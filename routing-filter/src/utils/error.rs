use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use super::i18n::request_locale;

/// Errors raised while configuring filters or resolving routes.
///
/// The language filter itself never fails: unknown or missing languages
/// degrade to "no language segment". These variants come from building the
/// chain, replacing the language set, and the host route table.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No route named '{0}'")]
    UnknownRoute(String),

    #[error("No route matches path '{0}'")]
    NoRouteMatches(String),

    #[error("Route '{route}' requires segment ':{segment}'")]
    MissingSegment { route: String, segment: String },

    #[error("Filter '{0}' is already installed")]
    DuplicateFilter(String),

    #[error("Filter '{0}' is not installed")]
    FilterNotFound(String),

    #[error("Invalid language code: '{0}'")]
    InvalidLanguage(String),

    #[error("Language set cannot be empty")]
    EmptyLanguageSet,

    #[error("Failed to compile language pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl RoutingError {
    pub fn missing_segment(route: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::MissingSegment { route: route.into(), segment: segment.into() }
    }
}

/// API error returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// Numeric error code carried in the response body
    pub fn error_code(&self) -> i32 {
        match self {
            // Resource errors 3xxx
            Self::ResourceNotFound(_) => 3000,
            Self::Routing(RoutingError::NoRouteMatches(_)) => 3001,

            // Validation errors 4xxx
            Self::InvalidInput(_) => 4002,

            // System errors 5xxx
            Self::InternalError(_) => 5001,
            Self::Routing(_) => 5003,
        }
    }

    /// Message in the locale of the current request
    pub fn localized_message(&self) -> String {
        let locale = request_locale().unwrap_or_else(|| rust_i18n::locale().to_string());
        match self {
            Self::ResourceNotFound(name) => {
                t!("error.not_found", locale = &locale, name = name).to_string()
            },
            Self::Routing(RoutingError::NoRouteMatches(path)) => {
                t!("error.not_found", locale = &locale, name = path).to_string()
            },
            Self::InvalidInput(msg) => msg.clone(),
            Self::InternalError(msg) => {
                t!("error.internal", locale = &locale, message = msg).to_string()
            },
            Self::Routing(err) => {
                t!("error.internal", locale = &locale, message = err.to_string()).to_string()
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let message = self.localized_message();

        let status = match code {
            3000..=3999 => StatusCode::NOT_FOUND,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(ApiErrorResponse { code, message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::not_found("product 7").error_code(), 3000);
        assert_eq!(
            ApiError::from(RoutingError::NoRouteMatches("/nope".into())).error_code(),
            3001
        );
        assert_eq!(ApiError::invalid_input("bad").error_code(), 4002);
        assert_eq!(ApiError::from(RoutingError::UnknownRoute("x".into())).error_code(), 5003);
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::not_found("product 7").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::invalid_input("bad id").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::internal_error("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_segment_display() {
        let err = RoutingError::missing_segment("product", "id");
        assert_eq!(err.to_string(), "Route 'product' requires segment ':id'");
    }
}
