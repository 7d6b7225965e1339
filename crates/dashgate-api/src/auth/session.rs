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

//! Request identity resolution from the session cookie

use crate::auth::token::TokenCodec;
use crate::error::ApiResult;
use crate::user_management::models::SafeUser;
use crate::user_management::store::UserStore;
use hyper::HeaderMap;
use hyper::header::COOKIE;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default name of the session cookie
pub const DEFAULT_COOKIE_NAME: &str = "auth-token";

/// How the resolver may look at the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// A live request; the session cookie is read and verified
    Request,
    /// Static or prerendered output; no request-specific data is read
    Static,
}

/// Result of resolving a request's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Authenticated user, if any
    pub user: Option<SafeUser>,

    /// The presented credential was invalid and should be cleared
    pub clear_credential: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            clear_credential: false,
        }
    }

    fn rejected() -> Self {
        Self {
            user: None,
            clear_credential: true,
        }
    }

    fn authenticated(user: SafeUser) -> Self {
        Self {
            user: Some(user),
            clear_credential: false,
        }
    }
}

/// Turns an inbound request into the current user, or nobody
pub struct SessionResolver {
    store: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    cookie_name: String,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn UserStore>, codec: Arc<TokenCodec>, cookie_name: impl Into<String>) -> Self {
        Self {
            store,
            codec,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the current user.
    ///
    /// Absence of a valid session is not an error. The returned user is
    /// built from the stored record, so its role is the live role rather
    /// than the one captured in the token.
    pub async fn resolve(&self, headers: &HeaderMap, mode: ResolveMode) -> ApiResult<Session> {
        if mode == ResolveMode::Static {
            return Ok(Session::anonymous());
        }

        let Some(token) = extract_session_token(headers, &self.cookie_name) else {
            return Ok(Session::anonymous());
        };

        let identity = match self.codec.verify(&token) {
            Ok(identity) => identity,
            Err(e) => {
                debug!("Rejected session token: {}", e);
                return Ok(Session::rejected());
            }
        };

        match self.store.find_by_id(&identity.subject).await? {
            Some(record) => {
                if record.role != identity.role {
                    debug!("Role of user {} changed since token issuance: {} -> {}", record.id, identity.role, record.role);
                }
                Ok(Session::authenticated(SafeUser::from(record)))
            }
            None => {
                warn!("Session token refers to missing user {}", identity.subject);
                Ok(Session::rejected())
            }
        }
    }
}

/// Find the named cookie across all `Cookie` headers
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(cookie_name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}", cookie_name, token, max_age_secs);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(cookie_name: &str, secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", cookie_name);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
