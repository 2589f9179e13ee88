use crate::config::ConfigError;
use crate::school::{SchoolServiceError, SnapshotError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Snapshot(SnapshotError),
    School(SchoolServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Snapshot(err) => write!(f, "snapshot error: {}", err),
            AppError::School(err) => write!(f, "school error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::School(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Snapshot(SnapshotError::Decode { .. }) => StatusCode::BAD_REQUEST,
            AppError::School(SchoolServiceError::School(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Snapshot(_)
            | AppError::School(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<SchoolServiceError> for AppError {
    fn from(value: SchoolServiceError) -> Self {
        Self::School(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::school::SchoolError;

    #[test]
    fn rejected_school_operations_map_to_unprocessable() {
        let err = AppError::from(SchoolServiceError::School(SchoolError::StudentNotFound));
        assert_eq!(err.to_string(), "school error: Student not found.");
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn corrupt_snapshots_map_to_bad_request() {
        let source = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let err = AppError::from(SnapshotError::Decode {
            path: "data/school.json".into(),
            source,
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
