//! User management data models

use crate::error::{ApiError, ApiResult};
use crate::rbac::Role;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

/// Longest accepted display name, in characters
pub const MAX_NAME_LEN: usize = 50;

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default and maximum page sizes for user listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Stored user record. Never leaves the server as-is.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier
    pub id: String,

    /// Normalized email address (unique)
    pub email: String,

    /// PHC-formatted password hash
    pub password_hash: String,

    /// Display name
    pub name: Option<String>,

    /// Assigned role
    pub role: Role,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a new record with a fresh id
    pub fn new(email: String, password_hash: String, name: Option<String>, role: Role) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Client-facing view of a user; carries no credential material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for SafeUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<UserRecord> for SafeUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Request to create a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Partial update of a user; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

/// Field changes applied to a stored record in one step
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<Option<String>>,
    pub role: Option<Role>,
}

/// Sortable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Email,
    #[default]
    CreatedAt,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// User listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            role: None,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl UserQuery {
    /// Parse from a raw query string such as `page=2&role=admin`
    pub fn from_query_string(query: Option<&str>) -> ApiResult<Self> {
        let mut parsed = Self::default();

        let Some(query) = query else {
            return Ok(parsed);
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    parsed.page = value.parse().ok().filter(|p| *p >= 1).ok_or_else(|| invalid("page must be a positive integer"))?;
                }
                "limit" => {
                    parsed.limit = value
                        .parse()
                        .ok()
                        .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
                        .ok_or_else(|| invalid(&format!("limit must be between 1 and {}", MAX_PAGE_SIZE)))?;
                }
                "search" => {
                    let term = value.trim();
                    parsed.search = (!term.is_empty()).then(|| term.to_string());
                }
                "role" if !value.is_empty() => {
                    parsed.role = Some(value.parse().map_err(|e: crate::rbac::UnknownRole| invalid(&e.to_string()))?);
                }
                "sort" => {
                    parsed.sort = match value.as_ref() {
                        "name" => SortField::Name,
                        "email" => SortField::Email,
                        "created_at" => SortField::CreatedAt,
                        _ => return Err(invalid("sort must be one of name, email, created_at")),
                    };
                }
                "order" => {
                    parsed.order = match value.as_ref() {
                        "asc" => SortOrder::Asc,
                        "desc" => SortOrder::Desc,
                        _ => return Err(invalid("order must be asc or desc")),
                    };
                }
                _ => {}
            }
        }

        Ok(parsed)
    }

    /// Number of records to skip
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

/// One page of users and the total match count
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<SafeUser>,
    pub total: u64,
}

/// Credential store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("User not found: {user_id}")]
    NotFound { user_id: String },

    #[error("Email already exists: {email}")]
    EmailExists { email: String },

    #[error("Operation would leave no super_admin")]
    LastSuperAdmin,

    #[error("Role of user {user_id} changed during the operation")]
    RoleChanged { user_id: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound {
                message: "User not found".to_string(),
            },
            StoreError::EmailExists { .. } => ApiError::Conflict {
                message: "Email is already registered".to_string(),
            },
            StoreError::LastSuperAdmin => ApiError::Forbidden {
                message: "Cannot remove the last super_admin".to_string(),
            },
            StoreError::RoleChanged { .. } => ApiError::Forbidden {
                message: "User role changed, retry the operation".to_string(),
            },
            StoreError::Storage { message } => ApiError::Database { message },
        }
    }
}

fn invalid(message: &str) -> ApiError {
    ApiError::Validation { message: message.to_string() }
}

/// Trim, lowercase and check the shape of an email address
pub fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();

    let valid = EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(&email));
    if !valid || email.len() > 254 {
        return Err(invalid("A valid email address is required"));
    }

    Ok(email)
}

/// Trim a display name; blank names become `None`
pub fn normalize_name(name: Option<&str>) -> ApiResult<Option<String>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(&format!("Name must be at most {} characters", MAX_NAME_LEN)));
    }

    Ok(Some(name.to_string()))
}

pub fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(&format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
    }
    Ok(())
}
