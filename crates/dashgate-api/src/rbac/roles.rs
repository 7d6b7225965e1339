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

//! Role definitions and management authority

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed role hierarchy, lowest tier first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Member,
    Editor,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Every role, lowest tier first
    pub const ALL: [Role; 5] = [Role::Viewer, Role::Member, Role::Editor, Role::Admin, Role::SuperAdmin];

    /// The top role; at least one holder must always exist
    pub const TOP: Role = Role::SuperAdmin;

    /// Lowest tier, assigned when a creator does not choose one
    pub const DEFAULT: Role = Role::Viewer;

    /// Position in the hierarchy (1-based)
    pub fn rank(self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Member => 2,
            Role::Editor => 3,
            Role::Admin => 4,
            Role::SuperAdmin => 5,
        }
    }

    /// Wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Member => "member",
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Roles this role may create, edit or delete.
    ///
    /// This is an explicit allow-list rather than "everything ranked lower":
    /// admins may not manage other admins, and the two lowest tiers manage
    /// nobody.
    pub fn manageable_roles(self) -> &'static [Role] {
        match self {
            Role::SuperAdmin => &Role::ALL,
            Role::Admin => &[Role::Viewer, Role::Member, Role::Editor],
            Role::Editor => &[Role::Viewer, Role::Member],
            Role::Member | Role::Viewer => &[],
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::DEFAULT
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL.into_iter().find(|role| role.as_str() == s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Strict comparison of hierarchy positions; a role never outranks itself
pub fn is_higher_role(a: Role, b: Role) -> bool {
    a.rank() > b.rank()
}

/// Whether `actor` has management authority over users holding `target`
pub fn can_manage(actor: Role, target: Role) -> bool {
    actor.manageable_roles().contains(&target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    #[test]
    fn test_role_ordering() {
        assert!(is_higher_role(Role::SuperAdmin, Role::Admin));
        assert!(is_higher_role(Role::Admin, Role::Editor));
        assert!(is_higher_role(Role::Editor, Role::Member));
        assert!(is_higher_role(Role::Member, Role::Viewer));
        assert!(!is_higher_role(Role::Viewer, Role::Member));

        for role in Role::ALL {
            assert!(!is_higher_role(role, role));
        }
    }

    #[test]
    fn test_management_table() {
        assert!(can_manage(Role::SuperAdmin, Role::SuperAdmin));
        assert!(can_manage(Role::SuperAdmin, Role::Viewer));

        assert!(can_manage(Role::Admin, Role::Editor));
        assert!(!can_manage(Role::Admin, Role::Admin));
        assert!(!can_manage(Role::Admin, Role::SuperAdmin));

        assert!(can_manage(Role::Editor, Role::Member));
        assert!(!can_manage(Role::Editor, Role::Editor));

        for target in Role::ALL {
            assert!(!can_manage(Role::Member, target));
            assert!(!can_manage(Role::Viewer, target));
        }
    }

    #[test]
    fn test_role_names_round_trip_through_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }

        assert!("owner".parse::<Role>().is_err());
        assert!(serde_json::from_str::<Role>("\"administrator\"").is_err());
    }

    #[test]
    fn test_default_role_is_lowest_tier() {
        assert_eq!(Role::default(), Role::Viewer);
        assert!(Role::ALL.iter().all(|r| *r == Role::default() || is_higher_role(*r, Role::default())));
    }

    proptest! {
        /// Authority never shrinks as rank grows
        #[test]
        fn prop_authority_is_monotonic(a in any_role(), b in any_role(), target in any_role()) {
            if is_higher_role(a, b) && can_manage(b, target) {
                prop_assert!(can_manage(a, target));
            }
        }

        /// Nobody below the top role manages a role at or above their own
        #[test]
        fn prop_no_upward_management(actor in any_role(), target in any_role()) {
            if actor != Role::TOP && !is_higher_role(actor, target) {
                prop_assert!(!can_manage(actor, target));
            }
        }
    }
}
