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

//! Authentication handlers

use crate::auth::{clear_session_cookie, session_cookie};
use crate::error::ApiResult;
use crate::handlers::{RequestContext, json_response, read_json, with_cookie};
use crate::models::{ApiResponse, ChangePasswordRequest, LoginRequest, ProfileUpdateRequest};
use crate::router::AppState;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use tracing::info;

/// Login handler
/// POST /api/auth/login
pub async fn login<B>(req: Request<B>, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    info!("Processing login request");

    state.login_limiter.check(&ctx.client_key())?;

    let request: LoginRequest = read_json(req, state.config.max_body_size).await?;
    let outcome = state.auth.login(request).await?;

    let max_age = state.auth.codec().ttl().num_seconds();
    let cookie = session_cookie(state.sessions.cookie_name(), &outcome.token, max_age, state.config.secure_cookies());

    let response = json_response(StatusCode::OK, &ApiResponse::success(outcome.user, "Login successful"))?;
    with_cookie(response, &cookie)
}

/// Logout handler; always succeeds
/// POST /api/auth/logout
pub async fn logout(state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    if let Some(user) = &ctx.session.user {
        info!("User {} logged out", user.id);
    }

    let cookie = clear_session_cookie(state.sessions.cookie_name(), state.config.secure_cookies());
    let response = json_response(StatusCode::OK, &ApiResponse::<()>::empty("Logged out"))?;
    with_cookie(response, &cookie)
}

/// Current user, or `null` data when anonymous
/// GET /api/auth/me
pub async fn me(ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    let message = if ctx.session.user.is_some() { "Current user" } else { "Not authenticated" };
    json_response(StatusCode::OK, &ApiResponse::success(ctx.session.user.clone(), message))
}

/// Self-service profile update
/// PATCH /api/auth/me
pub async fn update_me<B>(req: Request<B>, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let user = ctx.require_user()?;
    let request: ProfileUpdateRequest = read_json(req, state.config.max_body_size).await?;

    let updated = state.auth.update_profile(user, request).await?;
    json_response(StatusCode::OK, &ApiResponse::success(updated, "Profile updated"))
}

/// Change own password
/// POST /api/auth/password
pub async fn change_password<B>(req: Request<B>, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let user = ctx.require_user()?;
    let request: ChangePasswordRequest = read_json(req, state.config.max_body_size).await?;

    state.auth.change_password(user, request).await?;
    json_response(StatusCode::OK, &ApiResponse::<()>::empty("Password changed"))
}

/// Permissions of the current user
/// GET /api/auth/permissions
pub async fn permissions(state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    let user = ctx.require_user()?;
    json_response(StatusCode::OK, &ApiResponse::success(state.auth.permissions_of(user), "Permissions"))
}
