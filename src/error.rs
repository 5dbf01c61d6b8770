use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::validation::ValidationErrors;
use crate::views::html;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Shop API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Shop API returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{message}")]
    Api { message: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message suitable for a user-facing notice.
    ///
    /// Application failures carry the backend's own message; everything else
    /// falls back to `fallback`.
    #[must_use]
    pub fn notice(&self, fallback: &str) -> String {
        match self {
            Self::Api { message } if !message.trim().is_empty() => message.clone(),
            Self::Validation(errors) => errors.to_string(),
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status a page should carry when this error is shown.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Transport(_) | Self::Http { .. } | Self::Api { .. } => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            Self::Transport(e) => {
                tracing::error!("Shop API transport error: {e:?}");
                "The shop service could not be reached".to_string()
            }
            Self::Http { status, body } => {
                tracing::error!(%status, body = %body.chars().take(500).collect::<String>(), "Shop API error status");
                format!("The shop service answered with HTTP {status}")
            }
            Self::Api { message } => message.clone(),
            Self::Validation(errors) => errors.to_string(),
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                "Configuration error".to_string()
            }
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
        };

        (status, Html(html::error_page(status, &error_message))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
