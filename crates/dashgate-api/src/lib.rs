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

//! Dashgate API
//!
//! Authentication and permission core for an admin dashboard: cookie
//! sessions, a fixed role hierarchy, a static permission matrix and
//! authority-checked user management, served over HTTP.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limiting;
pub mod rbac;
pub mod router;
pub mod server;
pub mod user_management;
