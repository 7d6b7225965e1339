//! User credential storage layer

use crate::rbac::Role;
use crate::user_management::models::{SafeUser, SortField, SortOrder, StoreError, UserChanges, UserPage, UserQuery, UserRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// User storage trait.
///
/// Emails passed in are expected to be normalized already. Every method is
/// a single atomic step from the caller's point of view.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails if the email is taken
    async fn insert(&self, record: UserRecord) -> Result<UserRecord, StoreError>;

    /// Get user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Get user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Apply changes to a user. Refuses email collisions, demoting the
    /// last super_admin and, when `expected_role` is given, a user whose
    /// role no longer matches it.
    async fn update(&self, id: &str, expected_role: Option<Role>, changes: UserChanges) -> Result<UserRecord, StoreError>;

    /// Delete a user. Refuses to remove the last super_admin or a user
    /// whose role no longer matches `expected_role`.
    async fn delete(&self, id: &str, expected_role: Option<Role>) -> Result<UserRecord, StoreError>;

    /// Filtered, sorted, paginated listing
    async fn list(&self, query: &UserQuery) -> Result<UserPage, StoreError>;

    /// Number of users holding `role`
    async fn count_by_role(&self, role: Role) -> Result<u64, StoreError>;

    /// Total number of users
    async fn count(&self) -> Result<u64, StoreError>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserRecord>,
    // email -> user id
    email_index: HashMap<String, String>,
}

impl Tables {
    fn holders_of(&self, role: Role) -> usize {
        self.users.values().filter(|u| u.role == role).count()
    }
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, record: UserRecord) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.email_index.contains_key(&record.email) {
            return Err(StoreError::EmailExists { email: record.email });
        }
        if tables.users.contains_key(&record.id) {
            return Err(StoreError::Storage {
                message: format!("duplicate user id {}", record.id),
            });
        }

        tables.email_index.insert(record.email.clone(), record.id.clone());
        tables.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.email_index.get(email).and_then(|id| tables.users.get(id)).cloned())
    }

    async fn update(&self, id: &str, expected_role: Option<Role>, changes: UserChanges) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        let current = tables.users.get(id).cloned().ok_or_else(|| StoreError::NotFound { user_id: id.to_string() })?;

        if expected_role.is_some_and(|role| role != current.role) {
            return Err(StoreError::RoleChanged { user_id: id.to_string() });
        }

        if let Some(email) = &changes.email {
            if tables.email_index.get(email).is_some_and(|owner| owner != id) {
                return Err(StoreError::EmailExists { email: email.clone() });
            }
        }

        if let Some(role) = changes.role {
            if current.role == Role::TOP && role != Role::TOP && tables.holders_of(Role::TOP) <= 1 {
                return Err(StoreError::LastSuperAdmin);
            }
        }

        let mut updated = current;
        if let Some(email) = changes.email {
            if email != updated.email {
                tables.email_index.remove(&updated.email);
                tables.email_index.insert(email.clone(), id.to_string());
                updated.email = email;
            }
        }
        if let Some(password_hash) = changes.password_hash {
            updated.password_hash = password_hash;
        }
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(role) = changes.role {
            updated.role = role;
        }
        updated.updated_at = Utc::now();

        tables.users.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &str, expected_role: Option<Role>) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;

        let role = tables.users.get(id).map(|u| u.role).ok_or_else(|| StoreError::NotFound { user_id: id.to_string() })?;

        if expected_role.is_some_and(|expected| expected != role) {
            return Err(StoreError::RoleChanged { user_id: id.to_string() });
        }

        if role == Role::TOP && tables.holders_of(Role::TOP) <= 1 {
            return Err(StoreError::LastSuperAdmin);
        }

        let removed = tables.users.remove(id).ok_or_else(|| StoreError::NotFound { user_id: id.to_string() })?;
        tables.email_index.remove(&removed.email);
        Ok(removed)
    }

    async fn list(&self, query: &UserQuery) -> Result<UserPage, StoreError> {
        let tables = self.tables.read().await;
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<&UserRecord> = tables
            .users
            .values()
            .filter(|u| query.role.is_none_or(|role| u.role == role))
            .filter(|u| match &needle {
                Some(needle) => u.email.contains(needle.as_str()) || u.name.as_ref().is_some_and(|n| n.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match query.sort {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Email => a.email.cmp(&b.email),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            }
            // Stable order for equal keys
            .then_with(|| a.id.cmp(&b.id));

            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matches.len() as u64;
        let users = matches.into_iter().skip(query.offset()).take(query.limit as usize).map(SafeUser::from).collect();

        Ok(UserPage { users, total })
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.holders_of(role) as u64)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.len() as u64)
    }
}
