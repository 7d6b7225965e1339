// Dashgate
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error handling for the dashboard API
//! Every failure leaves the server as the uniform response envelope

use crate::models::ApiResponse;
use http_body_util::Full;
use hyper::{Response, StatusCode, body::Bytes};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Machine-readable error codes carried in the envelope's `code` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    DatabaseError,
    InternalError,
}

/// API error types following REST conventions
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Too many requests: {message}")]
    TooManyRequests { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            // Malformed request bodies are the client's fault
            ApiError::SerdeJsonError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the envelope error code
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation { .. } | ApiError::Conflict { .. } | ApiError::SerdeJsonError(_) => ErrorCode::ValidationError,
            ApiError::Unauthorized { .. } => ErrorCode::Unauthorized,
            ApiError::Forbidden { .. } => ErrorCode::Forbidden,
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::TooManyRequests { .. } => ErrorCode::RateLimited,
            ApiError::Database { .. } => ErrorCode::DatabaseError,
            ApiError::InternalServerError { .. } | ApiError::Configuration { .. } | ApiError::IoError(_) | ApiError::HttpError(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Whether the error is an unexpected server-side failure
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message shown to the client.
    ///
    /// Server-side failures are reduced to a generic sentence unless
    /// `expose_internal` is set (development mode).
    pub fn public_message(&self, expose_internal: bool) -> String {
        match self {
            ApiError::Validation { message }
            | ApiError::Conflict { message }
            | ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::TooManyRequests { message } => message.clone(),
            ApiError::SerdeJsonError(e) => format!("Invalid request body: {}", e),
            _ if expose_internal => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Build the envelope response for this error
    pub fn into_response(self, expose_internal: bool) -> Response<Full<Bytes>> {
        let status_code = self.status_code();

        if self.is_server_error() {
            error!("API Error: {} - {}", status_code, self);
        }

        let envelope = ApiResponse::<()>::failure(self.public_message(expose_internal), self.code());

        let json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize error response: {}", e);
                r#"{"success":false,"error":"Internal server error","code":"INTERNAL_ERROR"}"#.to_string()
            }
        };

        let mut response = Response::new(Full::new(Bytes::from(json)));
        *response.status_mut() = status_code;
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));
        response
            .headers_mut()
            .insert(hyper::header::CACHE_CONTROL, hyper::header::HeaderValue::from_static("no-store"));
        response
    }
}

/// Convert ApiError to HTTP response (production wording)
impl From<ApiError> for Response<Full<Bytes>> {
    fn from(error: ApiError) -> Self {
        error.into_response(false)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl From<hyper::http::Error> for ApiError {
    fn from(err: hyper::http::Error) -> Self {
        ApiError::HttpError(err.to_string())
    }
}
