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

//! Login attempt rate limiting
//! Fixed window counter keyed by client address

use crate::error::{ApiError, ApiResult};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::warn;

/// Number of tracked keys above which expired windows are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Rate limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the time window; zero disables limiting
    pub max_requests: u32,

    /// Time window for rate limiting
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Rate limit information
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Maximum requests allowed
    pub limit: u32,

    /// Remaining requests in current window
    pub remaining: u32,

    /// Time until rate limit resets (in seconds)
    pub reset_in: u64,

    /// Whether the request was allowed
    pub allowed: bool,
}

/// Fixed window counter rate limiter
#[derive(Debug)]
pub struct FixedWindowCounter {
    /// Maximum requests allowed per window
    max_requests: u32,

    /// Window duration
    window: Duration,

    /// Request counts per key and window
    counts: DashMap<String, (u32, Instant)>,
}

impl FixedWindowCounter {
    /// Create a new fixed window counter rate limiter
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counts: DashMap::new(),
        }
    }

    /// Check if a request is allowed
    pub fn is_allowed(&self, key: &str) -> RateLimitInfo {
        self.is_allowed_at(key, Instant::now())
    }

    /// Check if a request arriving at `now` is allowed
    pub fn is_allowed_at(&self, key: &str, now: Instant) -> RateLimitInfo {
        if self.counts.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.counts.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = *entry.value();

        // Check if we're in a new window
        if now.saturating_duration_since(window_start) >= self.window {
            *entry.value_mut() = (1, now);

            return RateLimitInfo {
                limit: self.max_requests,
                remaining: self.max_requests.saturating_sub(1),
                reset_in: self.window.as_secs(),
                allowed: true,
            };
        }

        let allowed = count < self.max_requests;
        let remaining = self.max_requests.saturating_sub(count + u32::from(allowed));

        if allowed {
            *entry.value_mut() = (count + 1, window_start);
        }

        let reset_in = self.window.saturating_sub(now.saturating_duration_since(window_start)).as_secs();

        RateLimitInfo {
            limit: self.max_requests,
            remaining,
            reset_in,
            allowed,
        }
    }

    /// Drop windows that have ended
    pub fn sweep(&self, now: Instant) {
        self.counts.retain(|_, (_, start)| now.saturating_duration_since(*start) < self.window);
    }

    pub fn tracked_keys(&self) -> usize {
        self.counts.len()
    }
}

/// Limits login attempts per client
#[derive(Debug)]
pub struct LoginRateLimiter {
    counter: Option<FixedWindowCounter>,
}

impl LoginRateLimiter {
    /// Create a limiter; a zero attempt budget disables it
    pub fn new(config: RateLimitConfig) -> Self {
        let counter = (config.max_requests > 0 && !config.window.is_zero()).then(|| FixedWindowCounter::new(config.max_requests, config.window));
        Self { counter }
    }

    pub fn is_enabled(&self) -> bool {
        self.counter.is_some()
    }

    /// Record an attempt for `key`, failing once the window's budget is spent
    pub fn check(&self, key: &str) -> ApiResult<Option<RateLimitInfo>> {
        let Some(counter) = &self.counter else {
            return Ok(None);
        };

        let info = counter.is_allowed(key);
        if info.allowed {
            return Ok(Some(info));
        }

        warn!("Login rate limit exceeded for {}", key);
        Err(ApiError::TooManyRequests {
            message: format!("Too many login attempts. Try again in {} seconds", info.reset_in.max(1)),
        })
    }
}
