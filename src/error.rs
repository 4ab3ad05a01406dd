use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FinderError>;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    #[error("Invalid avatar URL: {0}")]
    BadAvatarUrl(String),

    #[error("Avatar host not allowed: {0}")]
    AvatarHost(String),
}

impl IntoResponse for FinderError {
    fn into_response(self) -> Response {
        let status = match self {
            FinderError::InvalidFilter(_) | FinderError::BadAvatarUrl(_) => StatusCode::BAD_REQUEST,
            FinderError::AvatarHost(_) => StatusCode::FORBIDDEN,
            FinderError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FinderError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
