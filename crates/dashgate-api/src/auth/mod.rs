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

//! Authentication
//!
//! Password hashing, session tokens, request identity resolution and the
//! login flow built on top of them.

pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use password::{Argon2Hasher, HashCost, PasswordHasher};
pub use service::{AuthService, INVALID_CREDENTIALS, LoginOutcome};
pub use session::{DEFAULT_COOKIE_NAME, ResolveMode, Session, SessionResolver, clear_session_cookie, extract_session_token, session_cookie};
pub use token::{Claims, TokenCodec, TokenError, TokenIdentity};
