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

//! HTTP routing for the dashboard API

use crate::auth::{AuthService, PasswordHasher, ResolveMode, SessionResolver, TokenCodec, clear_session_cookie};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{RequestContext, auth, health, users};
use crate::rate_limiting::LoginRateLimiter;
use crate::user_management::{UserManager, UserStore};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared application state, built once at startup
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub auth: AuthService,
    pub users: UserManager,
    pub sessions: SessionResolver,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Wire up every service; fails if the token secret is unusable
    pub fn new(config: Config, store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> ApiResult<Self> {
        let codec = Arc::new(TokenCodec::new(config.jwt_secret.as_deref(), config.token_ttl())?);

        let auth = AuthService::new(store.clone(), hasher.clone(), codec.clone())?;
        let users = UserManager::new(store.clone(), hasher);
        let sessions = SessionResolver::new(store.clone(), codec, config.cookie_name.clone());
        let login_limiter = LoginRateLimiter::new(config.login_rate_limit);

        Ok(Self {
            config,
            store,
            auth,
            users,
            sessions,
            login_limiter,
        })
    }
}

/// HTTP router for the dashboard API
#[derive(Clone)]
pub struct Router {
    state: Arc<AppState>,
}

impl Router {
    /// Create a new router
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Route a request; every failure is turned into the error envelope
    pub async fn route<B>(&self, req: Request<B>, remote_addr: Option<SocketAddr>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        info!("Routing request: {} {}", method, path);

        let expose_internal = self.state.config.expose_internal_errors();

        let session = match self.state.sessions.resolve(req.headers(), ResolveMode::Request).await {
            Ok(session) => session,
            Err(e) => return e.into_response(expose_internal),
        };
        let clear_credential = session.clear_credential;
        let ctx = RequestContext { session, remote_addr };

        let mut response = match self.dispatch(req, &ctx).await {
            Ok(response) => response,
            Err(e) => {
                if !e.is_server_error() {
                    warn!("{} {} failed: {}", method, path, e);
                }
                e.into_response(expose_internal)
            }
        };

        // A rejected credential is dropped unless the handler already set a cookie
        if clear_credential && !response.headers().contains_key(SET_COOKIE) {
            let cookie = clear_session_cookie(self.state.sessions.cookie_name(), self.state.config.secure_cookies());
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }

        info!("{} {} -> {} in {:?}", method, path, response.status(), start.elapsed());
        response
    }

    async fn dispatch<B>(&self, req: Request<B>, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let state = &self.state;
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        match (&method, segments.as_slice()) {
            // Health
            (&Method::GET, ["", "api", "health"]) => health::health_check(state).await,

            // Auth
            (&Method::POST, ["", "api", "auth", "login"]) => auth::login(req, state, ctx).await,
            (&Method::POST, ["", "api", "auth", "logout"]) => auth::logout(state, ctx).await,
            (&Method::GET, ["", "api", "auth", "me"]) => auth::me(ctx).await,
            (&Method::PATCH, ["", "api", "auth", "me"]) => auth::update_me(req, state, ctx).await,
            (&Method::POST, ["", "api", "auth", "password"]) => auth::change_password(req, state, ctx).await,
            (&Method::GET, ["", "api", "auth", "permissions"]) => auth::permissions(state, ctx).await,

            // Users
            (&Method::GET, ["", "api", "users"]) => users::list_users(req, state, ctx).await,
            (&Method::POST, ["", "api", "users"]) => users::create_user(req, state, ctx).await,
            (&Method::GET, ["", "api", "users", id]) => users::get_user(id, state, ctx).await,
            (&Method::PUT, ["", "api", "users", id]) => users::update_user(req, id, state, ctx).await,
            (&Method::DELETE, ["", "api", "users", id]) => users::delete_user(id, state, ctx).await,

            _ => {
                warn!("Route not found: {} {}", method, path);
                Err(ApiError::NotFound {
                    message: format!("Route not found: {} {}", method, path),
                })
            }
        }
    }
}
