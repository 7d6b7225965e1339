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

//! Authentication service: login, password change and self-service profile

use crate::auth::password::{PasswordHasher, hash_password, verify_password};
use crate::auth::token::TokenCodec;
use crate::error::{ApiError, ApiResult};
use crate::models::{ChangePasswordRequest, LoginRequest, PermissionList, ProfileUpdateRequest};
use crate::rbac::{PROFILE_EDIT, PermissionMatrix};
use crate::user_management::models::{SafeUser, UserChanges, normalize_name, validate_password};
use crate::user_management::store::UserStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Message for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: SafeUser,
    pub token: String,
}

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<TokenCodec>,
    permissions: &'static PermissionMatrix,
    // Verified against when the email is unknown, so both failure paths
    // cost one hash verification
    dummy_hash: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>, codec: Arc<TokenCodec>) -> ApiResult<Self> {
        let dummy_hash = hasher.hash("dashgate-login-timing-placeholder")?;

        Ok(Self {
            store,
            hasher,
            codec,
            permissions: PermissionMatrix::global(),
            dummy_hash,
        })
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Authenticate by email and password and issue a session token
    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginOutcome> {
        let email = request.email.trim().to_lowercase();

        if email.is_empty() || request.password.is_empty() {
            return Err(ApiError::Validation {
                message: "Email and password are required".to_string(),
            });
        }

        let record = self.store.find_by_email(&email).await?;

        let stored_hash = record.as_ref().map_or_else(|| self.dummy_hash.clone(), |r| r.password_hash.clone());
        let password_ok = verify_password(self.hasher.clone(), request.password, stored_hash).await;

        let record = match record {
            Some(record) if password_ok => record,
            _ => {
                warn!("Failed login attempt");
                return Err(invalid_credentials());
            }
        };

        let token = self.codec.issue(&record.id, record.role)?;

        info!("User {} logged in", record.id);
        Ok(LoginOutcome {
            user: SafeUser::from(record),
            token,
        })
    }

    /// Change the current user's password after re-checking the old one
    pub async fn change_password(&self, user: &SafeUser, request: ChangePasswordRequest) -> ApiResult<()> {
        validate_password(&request.new_password)?;

        if request.new_password != request.confirm_password {
            return Err(ApiError::Validation {
                message: "Password confirmation does not match".to_string(),
            });
        }

        let record = self.store.find_by_id(&user.id).await?.ok_or_else(|| ApiError::Unauthorized {
            message: "Not authenticated".to_string(),
        })?;

        if !verify_password(self.hasher.clone(), request.current_password, record.password_hash).await {
            warn!("User {} supplied a wrong current password", user.id);
            return Err(ApiError::Validation {
                message: "Current password is incorrect".to_string(),
            });
        }

        let password_hash = hash_password(self.hasher.clone(), request.new_password).await?;
        self.store
            .update(&user.id, None, UserChanges {
                password_hash: Some(password_hash),
                ..Default::default()
            })
            .await?;

        info!("User {} changed their password", user.id);
        Ok(())
    }

    /// Update the current user's own profile
    pub async fn update_profile(&self, user: &SafeUser, request: ProfileUpdateRequest) -> ApiResult<SafeUser> {
        if !self.permissions.is_allowed(user.role, PROFILE_EDIT) {
            return Err(ApiError::Forbidden {
                message: format!("Missing permission: {}", PROFILE_EDIT),
            });
        }

        let name = normalize_name(request.name.as_deref())?;
        let updated = self
            .store
            .update(&user.id, None, UserChanges {
                name: Some(name),
                ..Default::default()
            })
            .await?;

        Ok(SafeUser::from(updated))
    }

    /// Permissions held by the current user
    pub fn permissions_of(&self, user: &SafeUser) -> PermissionList {
        PermissionList {
            role: user.role.to_string(),
            permissions: self.permissions.list_permissions(user.role).into_iter().map(str::to_string).collect(),
        }
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized {
        message: INVALID_CREDENTIALS.to_string(),
    }
}
