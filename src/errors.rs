use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Error types for payoff computation and the dashboard server.
/// Validation errors are raised synchronously and surfaced to the page as
/// inline messages; they never terminate the process.
#[derive(Debug, thiserror::Error)]
pub enum PayoffError {
    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("invalid leg: {0}")]
    InvalidLeg(String),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl PayoffError {
    /// Stable tag used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "invalid_range",
            Self::InvalidLeg(_) => "invalid_leg",
            Self::InvalidScenario(_) => "invalid_scenario",
            Self::Config(_) => "config",
            Self::Parse(_) => "parse",
        }
    }

    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange(_) | Self::InvalidLeg(_) | Self::InvalidScenario(_) | Self::Parse(_)
        )
    }
}

impl From<serde_json::Error> for PayoffError {
    fn from(e: serde_json::Error) -> Self {
        PayoffError::Parse(e.to_string())
    }
}

impl IntoResponse for PayoffError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub type PayoffResult<T> = Result<T, PayoffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let resp = PayoffError::InvalidLeg("strike must be positive".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_config_maps_to_500() {
        let resp = PayoffError::Config("SERVER_PORT".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(PayoffError::InvalidRange(String::new()).kind(), "invalid_range");
        assert_eq!(PayoffError::InvalidScenario(String::new()).kind(), "invalid_scenario");
    }
}
