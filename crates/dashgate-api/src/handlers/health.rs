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

//! Health check handlers

use crate::error::ApiResult;
use crate::handlers::json_response;
use crate::models::{ApiResponse, HealthResponse};
use crate::router::AppState;
use chrono::Utc;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use tracing::{info, warn};

/// Health check handler
/// GET /api/health
pub async fn health_check(state: &AppState) -> ApiResult<Response<Full<Bytes>>> {
    info!("Processing health check request");

    let store_healthy = match state.store.count().await {
        Ok(_) => true,
        Err(e) => {
            warn!("Credential store health check failed: {}", e);
            false
        }
    };

    let health = HealthResponse {
        status: if store_healthy { "healthy".to_string() } else { "unhealthy".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        store: if store_healthy { "healthy".to_string() } else { "unhealthy".to_string() },
    };

    let status = if store_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    json_response(status, &ApiResponse::success(health, "Service status"))
}
