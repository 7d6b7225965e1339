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

//! Session token issuing and verification

use crate::error::{ApiError, ApiResult};
use crate::rbac::Role;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "dashgate";
const AUDIENCE: &str = "dashgate-console";

/// Shortest secret accepted for HS256 signing
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime, in days
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Secrets that ship in sample configuration and must never sign tokens
const PLACEHOLDER_SECRETS: &[&str] = &["default-secret-change-in-production", "your-secret-key", "secret", "changeme", "change-me"];

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role at issuance
    pub role: Role,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token ID
    pub jti: String,
}

/// Identity carried by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub subject: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Reasons a token is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a well-formed JWT")]
    Malformed,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("token claims are invalid: {0}")]
    InvalidClaims(String),
}

/// HS256 token codec bound to the server secret
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec; refuses missing, placeholder or short secrets
    pub fn new(secret: Option<&str>, ttl: Duration) -> ApiResult<Self> {
        let secret = secret.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| ApiError::Configuration {
            message: "JWT secret is not configured".to_string(),
        })?;

        if PLACEHOLDER_SECRETS.iter().any(|p| p.eq_ignore_ascii_case(secret)) {
            return Err(ApiError::Configuration {
                message: "JWT secret is left at a placeholder value".to_string(),
            });
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(ApiError::Configuration {
                message: format!("JWT secret must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        if ttl <= Duration::zero() {
            return Err(ApiError::Configuration {
                message: "Token lifetime must be positive".to_string(),
            });
        }

        if ttl > Duration::days(MAX_TOKEN_TTL_DAYS) {
            return Err(ApiError::Configuration {
                message: format!("Token lifetime must not exceed {} days", MAX_TOKEN_TTL_DAYS),
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);
        // Expiry is checked against the caller's clock in verify_at
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, subject: &str, role: Role) -> ApiResult<String> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, role: Role, now: DateTime<Utc>) -> ApiResult<String> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| ApiError::InternalServerError {
            message: "Token expiry is out of range".to_string(),
        })?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| ApiError::InternalServerError {
            message: format!("Failed to sign token: {}", e),
        })
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<TokenIdentity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenIdentity, TokenError> {
        if !is_well_formed(token) {
            return Err(TokenError::Malformed);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(classify)?.claims;

        if claims.sub.is_empty() {
            return Err(TokenError::InvalidClaims("empty subject".to_string()));
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or_else(|| TokenError::InvalidClaims("iat out of range".to_string()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| TokenError::InvalidClaims("exp out of range".to_string()))?;

        if expires_at <= issued_at {
            return Err(TokenError::InvalidClaims("exp precedes iat".to_string()));
        }

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(TokenIdentity {
            subject: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

/// Exactly three non-empty, base64url-decodable segments
fn is_well_formed(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|part| !part.is_empty() && URL_SAFE_NO_PAD.decode(part).is_ok())
}

fn classify(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidAlgorithm => TokenError::Malformed,
        other => TokenError::InvalidClaims(format!("{:?}", other)),
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET: &str = "test-secret-0123456789-abcdefghijklmnop";

#[cfg(test)]
pub(crate) fn test_codec() -> TokenCodec {
    TokenCodec::new(Some(TEST_SECRET), Duration::days(7)).unwrap()
}
