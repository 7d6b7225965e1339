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

//! Permission definitions and the static permission matrix

use crate::rbac::roles::Role;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const USERS_VIEW: &str = "users.view";
pub const USERS_CREATE: &str = "users.create";
pub const USERS_EDIT: &str = "users.edit";
pub const USERS_DELETE: &str = "users.delete";
pub const SETTINGS_VIEW: &str = "settings.view";
pub const SETTINGS_EDIT: &str = "settings.edit";
pub const DASHBOARD_VIEW: &str = "dashboard.view";
pub const PROFILE_VIEW: &str = "profile.view";
pub const PROFILE_EDIT: &str = "profile.edit";
pub const CONTENT_VIEW: &str = "content.view";
pub const CONTENT_EDIT: &str = "content.edit";
pub const CONTENT_CREATE: &str = "content.create";
pub const CONTENT_DELETE: &str = "content.delete";

const EVERYONE: &[Role] = &Role::ALL;
const STAFF: &[Role] = &[Role::SuperAdmin, Role::Admin, Role::Editor];
const ADMINS: &[Role] = &[Role::SuperAdmin, Role::Admin];
const SUPER_ONLY: &[Role] = &[Role::SuperAdmin];

/// Source table: permission name and the roles allowed to exercise it
const MATRIX: &[(&str, &[Role])] = &[
    (USERS_VIEW, STAFF),
    (USERS_CREATE, ADMINS),
    (USERS_EDIT, ADMINS),
    (USERS_DELETE, SUPER_ONLY),
    (SETTINGS_VIEW, ADMINS),
    (SETTINGS_EDIT, SUPER_ONLY),
    (DASHBOARD_VIEW, EVERYONE),
    (PROFILE_VIEW, EVERYONE),
    (PROFILE_EDIT, EVERYONE),
    (CONTENT_VIEW, STAFF),
    (CONTENT_EDIT, STAFF),
    (CONTENT_CREATE, STAFF),
    (CONTENT_DELETE, ADMINS),
];

static GLOBAL: LazyLock<PermissionMatrix> = LazyLock::new(PermissionMatrix::new);

/// Immutable mapping from permission names to allowed roles.
///
/// This is the only place resource permissions are decided. Unknown
/// permission names are never allowed.
#[derive(Debug, Clone)]
pub struct PermissionMatrix {
    entries: BTreeMap<&'static str, &'static [Role]>,
}

impl PermissionMatrix {
    /// Build the matrix from the built-in table
    pub fn new() -> Self {
        Self {
            entries: MATRIX.iter().copied().collect(),
        }
    }

    /// Process-wide matrix, built on first use
    pub fn global() -> &'static PermissionMatrix {
        &GLOBAL
    }

    /// Whether `role` may exercise `permission`
    pub fn is_allowed(&self, role: Role, permission: &str) -> bool {
        self.entries.get(permission).is_some_and(|roles| roles.contains(&role))
    }

    /// Whether `role` holds at least one of `permissions`
    pub fn is_allowed_any(&self, role: Role, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.is_allowed(role, p))
    }

    /// Whether `role` holds every one of `permissions`
    pub fn is_allowed_all(&self, role: Role, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.is_allowed(role, p))
    }

    /// All permissions held by `role`, in name order
    pub fn list_permissions(&self, role: Role) -> Vec<&'static str> {
        self.entries.iter().filter(|(_, roles)| roles.contains(&role)).map(|(name, _)| *name).collect()
    }

    /// Roles allowed to exercise `permission`, if it exists
    pub fn roles_for(&self, permission: &str) -> Option<&'static [Role]> {
        self.entries.get(permission).copied()
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_user_management_permissions() {
        let matrix = PermissionMatrix::global();

        assert!(matrix.is_allowed(Role::Editor, USERS_VIEW));
        assert!(!matrix.is_allowed(Role::Viewer, USERS_VIEW));
        assert!(!matrix.is_allowed(Role::Member, USERS_VIEW));

        assert!(matrix.is_allowed(Role::Admin, USERS_CREATE));
        assert!(!matrix.is_allowed(Role::Editor, USERS_CREATE));

        assert!(matrix.is_allowed(Role::SuperAdmin, USERS_DELETE));
        assert!(!matrix.is_allowed(Role::Admin, USERS_DELETE));
    }

    #[test]
    fn test_unknown_permission_is_denied() {
        let matrix = PermissionMatrix::new();

        for role in Role::ALL {
            assert!(!matrix.is_allowed(role, "users.impersonate"));
            assert!(!matrix.is_allowed(role, ""));
        }
        assert!(matrix.roles_for("users.impersonate").is_none());
    }

    #[test]
    fn test_any_and_all() {
        let matrix = PermissionMatrix::new();

        assert!(matrix.is_allowed_any(Role::Editor, &[USERS_DELETE, CONTENT_EDIT]));
        assert!(!matrix.is_allowed_all(Role::Editor, &[USERS_DELETE, CONTENT_EDIT]));
        assert!(matrix.is_allowed_all(Role::Admin, &[USERS_VIEW, USERS_EDIT]));

        assert!(!matrix.is_allowed_any(Role::SuperAdmin, &[]));
        assert!(matrix.is_allowed_all(Role::Viewer, &[]));
        assert!(!matrix.is_allowed_all(Role::SuperAdmin, &[USERS_VIEW, "bogus"]));
    }

    #[test]
    fn test_list_permissions() {
        let matrix = PermissionMatrix::new();

        assert_eq!(matrix.list_permissions(Role::Viewer), vec![DASHBOARD_VIEW, PROFILE_EDIT, PROFILE_VIEW]);
        assert_eq!(matrix.list_permissions(Role::SuperAdmin).len(), MATRIX.len());
    }

    proptest! {
        /// is_allowed agrees exactly with the configured role set
        #[test]
        fn prop_permission_closure(role in prop::sample::select(Role::ALL.to_vec()), idx in 0..MATRIX.len()) {
            let matrix = PermissionMatrix::global();
            let (name, roles) = MATRIX[idx];
            prop_assert_eq!(matrix.is_allowed(role, name), roles.contains(&role));
        }

        #[test]
        fn prop_unknown_names_denied(role in prop::sample::select(Role::ALL.to_vec()), name in "[a-z]{1,8}\\.[a-z]{1,8}") {
            let matrix = PermissionMatrix::global();
            prop_assume!(matrix.roles_for(&name).is_none());
            prop_assert!(!matrix.is_allowed(role, &name));
        }
    }
}
