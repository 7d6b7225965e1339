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

//! User management handlers

use crate::error::ApiResult;
use crate::handlers::{RequestContext, json_response, read_json};
use crate::models::{ApiResponse, Pagination};
use crate::router::AppState;
use crate::user_management::models::{CreateUserRequest, UpdateUserRequest, UserQuery};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

/// List users
/// GET /api/users
pub async fn list_users<B>(req: Request<B>, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    let actor = ctx.require_user()?;
    let query = UserQuery::from_query_string(req.uri().query())?;

    let page = state.users.list_users(actor, &query).await?;
    let pagination = Pagination::new(query.page, query.limit, page.total);

    json_response(StatusCode::OK, &ApiResponse::success(page.users, "Users").with_pagination(pagination))
}

/// Get one user
/// GET /api/users/{id}
pub async fn get_user(user_id: &str, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    let actor = ctx.require_user()?;
    let user = state.users.get_user(actor, user_id).await?;

    json_response(StatusCode::OK, &ApiResponse::success(user, "User"))
}

/// Create a user
/// POST /api/users
pub async fn create_user<B>(req: Request<B>, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = ctx.require_user()?;
    let request: CreateUserRequest = read_json(req, state.config.max_body_size).await?;

    let user = state.users.create_user(actor, request).await?;
    json_response(StatusCode::CREATED, &ApiResponse::success(user, "User created"))
}

/// Update a user
/// PUT /api/users/{id}
pub async fn update_user<B>(req: Request<B>, user_id: &str, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let actor = ctx.require_user()?;
    let request: UpdateUserRequest = read_json(req, state.config.max_body_size).await?;

    let user = state.users.update_user(actor, user_id, request).await?;
    json_response(StatusCode::OK, &ApiResponse::success(user, "User updated"))
}

/// Delete a user
/// DELETE /api/users/{id}
pub async fn delete_user(user_id: &str, state: &AppState, ctx: &RequestContext) -> ApiResult<Response<Full<Bytes>>> {
    let actor = ctx.require_user()?;
    state.users.delete_user(actor, user_id).await?;

    json_response(StatusCode::OK, &ApiResponse::<()>::empty("User deleted"))
}
