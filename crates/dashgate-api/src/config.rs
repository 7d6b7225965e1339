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

//! Configuration management for the dashboard API

use crate::auth::password::HashCost;
use crate::auth::session::DEFAULT_COOKIE_NAME;
use crate::rate_limiting::RateLimitConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default session lifetime: 7 days
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Credentials for the first super_admin, created only on an empty store
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin").field("email", &self.email).field("password", &"<redacted>").field("name", &self.name).finish()
    }
}

/// Configuration for the dashboard API
#[derive(Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// JWT signing secret; the server refuses to start without one
    pub jwt_secret: Option<String>,

    /// Session token lifetime in seconds
    pub token_ttl_secs: i64,

    /// Name of the session cookie
    pub cookie_name: String,

    /// Deployment environment; controls the cookie `Secure` flag and error detail
    pub environment: Environment,

    /// Password hashing work factor
    pub hash_cost: HashCost,

    /// Login attempts per client address
    pub login_rate_limit: RateLimitConfig,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Optional first super_admin
    pub seed_admin: Option<SeedAdmin>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("cookie_name", &self.cookie_name)
            .field("environment", &self.environment)
            .field("hash_cost", &self.hash_cost)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("max_body_size", &self.max_body_size)
            .field("seed_admin", &self.seed_admin)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            jwt_secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            environment: Environment::default(),
            hash_cost: HashCost::default(),
            login_rate_limit: RateLimitConfig::default(),
            max_body_size: 1024 * 1024, // 1MB
            seed_admin: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let seed_admin = match (get("DASHGATE_SEED_ADMIN_EMAIL"), lookup("DASHGATE_SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !password.is_empty() => Some(SeedAdmin {
                email,
                password,
                name: get("DASHGATE_SEED_ADMIN_NAME"),
            }),
            _ => None,
        };

        Self {
            bind_address: get("DASHGATE_BIND_ADDRESS").unwrap_or(defaults.bind_address),

            jwt_secret: get("DASHGATE_JWT_SECRET"),

            token_ttl_secs: parse_or(&get, "DASHGATE_TOKEN_TTL_SECS", defaults.token_ttl_secs),

            cookie_name: get("DASHGATE_COOKIE_NAME").unwrap_or(defaults.cookie_name),

            environment: parse_or(&get, "DASHGATE_ENV", defaults.environment),

            hash_cost: HashCost {
                memory_kib: parse_or(&get, "DASHGATE_ARGON2_MEMORY_KIB", defaults.hash_cost.memory_kib),
                iterations: parse_or(&get, "DASHGATE_ARGON2_ITERATIONS", defaults.hash_cost.iterations),
                parallelism: parse_or(&get, "DASHGATE_ARGON2_PARALLELISM", defaults.hash_cost.parallelism),
            },

            login_rate_limit: RateLimitConfig {
                max_requests: parse_or(&get, "DASHGATE_LOGIN_MAX_ATTEMPTS", defaults.login_rate_limit.max_requests),
                window: Duration::from_secs(parse_or(&get, "DASHGATE_LOGIN_WINDOW_SECS", defaults.login_rate_limit.window.as_secs())),
            },

            max_body_size: parse_or(&get, "DASHGATE_MAX_BODY_SIZE", defaults.max_body_size),

            seed_admin,
        }
    }

    /// Token lifetime as a chrono duration; out-of-range values saturate
    /// and are then refused by the token codec
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.token_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    /// Whether internal error details may be returned to clients
    pub fn expose_internal_errors(&self) -> bool {
        !self.environment.is_production()
    }

    /// Whether cookies carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        None => default,
    }
}
