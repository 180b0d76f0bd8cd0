// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::models::theme::ThemeCategory;

/// Global Application Error Enum.
/// Every failure the exam engine can surface maps to exactly one variant,
/// so callers can match on the kind instead of parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 404: exam, attempt or theme absent.
    #[error("{0}")]
    NotFound(String),

    /// 403: the acting user does not own the attempt.
    #[error("{0}")]
    Forbidden(String),

    /// 409: transition attempted on a finished attempt.
    #[error("{0}")]
    InvalidState(String),

    /// 400: fewer candidates than the exam shape requires.
    /// `category` is set for simulacro exams.
    #[error("{}", insufficient_message(.category, .found, .required))]
    InsufficientQuestions {
        category: Option<ThemeCategory>,
        found: usize,
        required: usize,
    },

    /// 400: a simulacro was requested but a theme category is empty.
    #[error("No {} themes found. Please seed themes first.", category_label(.0))]
    MissingThemeCategory(ThemeCategory),

    /// 400: malformed input at the boundary.
    #[error("{0}")]
    Validation(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 500
    #[error("{0}")]
    Internal(String),
}

fn category_label(category: &ThemeCategory) -> &'static str {
    category.label()
}

fn insufficient_message(category: &Option<ThemeCategory>, found: &usize, required: &usize) -> String {
    match category {
        Some(c) => format!(
            "Not enough {} questions. Found {}, need {}",
            c.label(),
            found,
            required
        ),
        None => format!(
            "Not enough questions available. Found {}, requested {}",
            found, required
        ),
    }
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InsufficientQuestions { .. } => "insufficient_questions",
            AppError::MissingThemeCategory(_) => "missing_theme_category",
            AppError::Validation(_) => "validation_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::InsufficientQuestions { .. }
            | AppError::MissingThemeCategory(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            AppError::InsufficientQuestions {
                category,
                found,
                required,
            } => json!({
                "category": category,
                "found": found,
                "required": required,
            }),
            AppError::MissingThemeCategory(category) => json!({ "category": category }),
            _ => Value::Null,
        }
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": self.kind(),
            "message": message,
            "details": self.details(),
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
