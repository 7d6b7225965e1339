//! User management business logic

use crate::auth::password::{PasswordHasher, hash_password};
use crate::error::{ApiError, ApiResult};
use crate::rbac::{PermissionMatrix, Role, USERS_CREATE, USERS_DELETE, USERS_EDIT, USERS_VIEW, can_manage};
use crate::user_management::models::{
    CreateUserRequest, SafeUser, UpdateUserRequest, UserChanges, UserPage, UserQuery, UserRecord, normalize_email, normalize_name, validate_password,
};
use crate::user_management::store::UserStore;
use std::sync::Arc;
use tracing::{info, warn};

/// User manager.
///
/// Every mutation is checked against the permission matrix and the
/// management authority table before anything is written.
pub struct UserManager {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    permissions: &'static PermissionMatrix,
}

impl UserManager {
    /// Create a new user manager
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            hasher,
            permissions: PermissionMatrix::global(),
        }
    }

    /// List users
    pub async fn list_users(&self, actor: &SafeUser, query: &UserQuery) -> ApiResult<UserPage> {
        self.require(actor, USERS_VIEW)?;
        Ok(self.store.list(query).await?)
    }

    /// Get a single user
    pub async fn get_user(&self, actor: &SafeUser, user_id: &str) -> ApiResult<SafeUser> {
        self.require(actor, USERS_VIEW)?;

        let record = self.store.find_by_id(user_id).await?.ok_or_else(not_found)?;
        Ok(SafeUser::from(record))
    }

    /// Create a new user
    pub async fn create_user(&self, actor: &SafeUser, request: CreateUserRequest) -> ApiResult<SafeUser> {
        self.require(actor, USERS_CREATE)?;

        let role = request.role.unwrap_or(Role::DEFAULT);
        if !can_manage(actor.role, role) {
            warn!("User {} ({}) may not create a user with role {}", actor.id, actor.role, role);
            return Err(forbidden(&format!("Not allowed to assign role {}", role)));
        }

        let email = normalize_email(&request.email)?;
        let name = normalize_name(request.name.as_deref())?;
        validate_password(&request.password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict {
                message: "Email is already registered".to_string(),
            });
        }

        let password_hash = hash_password(self.hasher.clone(), request.password).await?;
        let created = self.store.insert(UserRecord::new(email, password_hash, name, role)).await?;

        info!("User {} created user {} with role {}", actor.id, created.id, created.role);
        Ok(SafeUser::from(created))
    }

    /// Update a user
    pub async fn update_user(&self, actor: &SafeUser, user_id: &str, request: UpdateUserRequest) -> ApiResult<SafeUser> {
        self.require(actor, USERS_EDIT)?;

        let target = self.store.find_by_id(user_id).await?.ok_or_else(not_found)?;

        if !can_manage(actor.role, target.role) {
            warn!("User {} ({}) may not manage user {} ({})", actor.id, actor.role, target.id, target.role);
            return Err(forbidden("Not allowed to manage this user"));
        }

        if let Some(role) = request.role {
            if !can_manage(actor.role, role) {
                warn!("User {} ({}) may not assign role {}", actor.id, actor.role, role);
                return Err(forbidden(&format!("Not allowed to assign role {}", role)));
            }
        }

        if request.is_empty() {
            return Err(ApiError::Validation {
                message: "No fields to update".to_string(),
            });
        }

        let mut changes = UserChanges {
            role: request.role,
            ..Default::default()
        };

        if let Some(email) = &request.email {
            changes.email = Some(normalize_email(email)?);
        }
        if request.name.is_some() {
            changes.name = Some(normalize_name(request.name.as_deref())?);
        }
        if let Some(password) = &request.password {
            validate_password(password)?;
        }

        if target.role == Role::TOP && request.role.is_some_and(|role| role != Role::TOP) && self.store.count_by_role(Role::TOP).await? <= 1 {
            return Err(forbidden("Cannot demote the last super_admin"));
        }

        if let Some(password) = request.password {
            changes.password_hash = Some(hash_password(self.hasher.clone(), password).await?);
        }

        // The write is refused if the target's role moved since the authority check
        let updated = self.store.update(user_id, Some(target.role), changes).await?;

        info!("User {} updated user {}", actor.id, updated.id);
        Ok(SafeUser::from(updated))
    }

    /// Delete a user
    pub async fn delete_user(&self, actor: &SafeUser, user_id: &str) -> ApiResult<()> {
        self.require(actor, USERS_DELETE)?;

        if actor.id == user_id {
            warn!("User {} attempted to delete their own account", actor.id);
            return Err(forbidden("Cannot delete your own account"));
        }

        let target = self.store.find_by_id(user_id).await?.ok_or_else(not_found)?;

        if !can_manage(actor.role, target.role) {
            warn!("User {} ({}) may not delete user {} ({})", actor.id, actor.role, target.id, target.role);
            return Err(forbidden("Not allowed to delete this user"));
        }

        if target.role == Role::TOP && self.store.count_by_role(Role::TOP).await? <= 1 {
            return Err(forbidden("Cannot delete the last super_admin"));
        }

        // The store re-checks the role and the last super_admin rule under its own lock
        self.store.delete(user_id, Some(target.role)).await?;

        info!("User {} deleted user {}", actor.id, user_id);
        Ok(())
    }

    /// Create the first super_admin when the store is empty.
    ///
    /// Returns `None` when users already exist.
    pub async fn seed_super_admin(&self, email: &str, password: &str, name: Option<&str>) -> ApiResult<Option<SafeUser>> {
        if self.store.count().await? > 0 {
            return Ok(None);
        }

        let email = normalize_email(email)?;
        let name = normalize_name(name)?;
        validate_password(password)?;

        let password_hash = hash_password(self.hasher.clone(), password.to_string()).await?;
        let created = self.store.insert(UserRecord::new(email, password_hash, name, Role::TOP)).await?;

        info!("Seeded initial super_admin {}", created.email);
        Ok(Some(SafeUser::from(created)))
    }

    fn require(&self, actor: &SafeUser, permission: &str) -> ApiResult<()> {
        if self.permissions.is_allowed(actor.role, permission) {
            return Ok(());
        }

        warn!("User {} ({}) lacks permission {}", actor.id, actor.role, permission);
        Err(forbidden(&format!("Missing permission: {}", permission)))
    }
}

fn forbidden(message: &str) -> ApiError {
    ApiError::Forbidden { message: message.to_string() }
}

fn not_found() -> ApiError {
    ApiError::NotFound {
        message: "User not found".to_string(),
    }
}
