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

//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod users;


use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::models::ApiResponse;
use crate::user_management::models::SafeUser;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue, SET_COOKIE};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

/// Per-request data resolved before dispatch
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: Session,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Current user, or UNAUTHORIZED
    pub fn require_user(&self) -> ApiResult<&SafeUser> {
        self.session.user.as_ref().ok_or_else(|| ApiError::Unauthorized {
            message: "Authentication required".to_string(),
        })
    }

    /// Key used for per-client limits
    pub fn client_key(&self) -> String {
        self.remote_addr.map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string())
    }
}

/// Read and deserialize a JSON body of at most `max_size` bytes
pub async fn read_json<B, T>(req: Request<B>, max_size: usize) -> ApiResult<T>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    T: DeserializeOwned,
{
    let body = Limited::new(req.into_body(), max_size).collect().await.map_err(|e| ApiError::Validation {
        message: format!("Failed to read request body: {}", e),
    })?;

    Ok(serde_json::from_slice(&body.to_bytes())?)
}

/// Serialize an envelope into a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, envelope: &ApiResponse<T>) -> ApiResult<Response<Full<Bytes>>> {
    let json = serde_json::to_string(envelope)?;

    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CACHE_CONTROL, "no-store")
        .body(Full::new(Bytes::from(json)))?)
}

/// Attach a `Set-Cookie` header
pub fn with_cookie(mut response: Response<Full<Bytes>>, cookie: &str) -> ApiResult<Response<Full<Bytes>>> {
    let value = HeaderValue::from_str(cookie).map_err(|e| ApiError::InternalServerError {
        message: format!("Invalid cookie header: {}", e),
    })?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}
