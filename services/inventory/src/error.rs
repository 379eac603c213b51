//! Error responses for the inventory service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::{AssignError, DirectoryError, ErrorKind, RegistryError};
use crate::views;

/// Failure that escaped a handler
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Assignment(#[from] AssignError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Directory(e) => e.kind(),
            AppError::Registry(e) => e.kind(),
            AppError::Assignment(e) => e.kind(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!("Request rejected: {}", self);
            self.to_string()
        };

        (status, views::error_page(&message)).into_response()
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;
