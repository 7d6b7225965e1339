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

//! Data models for the REST API

use crate::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ====== Response Envelope ======

/// Uniform response envelope used by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded
    pub success: bool,

    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Human-readable success message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error code from the fixed taxonomy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,

    /// Pagination metadata for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// Successful response with a payload
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
            code: None,
            pagination: None,
        }
    }

    /// Successful response without a payload
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            code: None,
            pagination: None,
        }
    }

    /// Failed response
    pub fn failure(error: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            code: Some(code),
            pagination: None,
        }
    }

    /// Attach pagination metadata
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// Pagination information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page (1-based)
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Total number of matching items
    pub total: u64,

    /// Total number of pages
    pub total_pages: u32,

    /// Whether a next page exists
    pub has_next: bool,

    /// Whether a previous page exists
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit as u64) as u32;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

// ====== Health Models ======

/// Liveness probe payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,

    /// Crate version
    pub version: String,

    /// Time of the check
    pub timestamp: DateTime<Utc>,

    /// Credential store reachable
    pub store: String,
}

// ====== Authentication Models ======

/// Login request
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Change password request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password, re-verified before the change
    pub current_password: String,

    /// New password
    pub new_password: String,

    /// Must repeat `new_password`
    pub confirm_password: String,
}

/// Self-service profile update
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    /// Display name; `null` clears it
    pub name: Option<String>,
}

/// Permissions held by the current user
#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionList {
    pub role: String,
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let pagination = Pagination::new(2, 10, 25);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next);
        assert!(pagination.has_prev);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_next);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_envelope_skips_absent_fields() {
        let json = serde_json::to_value(ApiResponse::<()>::failure("nope", ErrorCode::Forbidden)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "FORBIDDEN");
        assert!(json.get("data").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(1, 10, 11)).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["hasPrev"], false);
    }
}
