use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures while reading the sales workbook. None of these leave the loader;
/// they decide which fallback notice the dashboard shows.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("sales workbook not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read workbook: {0}")]
    Workbook(String),
    #[error("sheet '{0}' has no header row")]
    EmptySheet(String),
    #[error("required column '{0}' is missing from the header row")]
    MissingColumn(&'static str),
}
