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

//! Password hashing

use crate::error::{ApiError, ApiResult};
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// One-way salted password hashing.
///
/// The stored form is self-contained: everything needed to verify a
/// password is embedded in the string returned by `hash`.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password
    fn hash(&self, plaintext: &str) -> ApiResult<String>;

    /// Check a plaintext password against a stored form. Malformed stored
    /// forms verify as `false`.
    fn verify(&self, plaintext: &str, stored: &str) -> bool;
}

/// Argon2 work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Argon2id password hasher producing PHC strings
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher with the given work factor
    pub fn new(cost: HashCost) -> ApiResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None).map_err(|e| ApiError::Configuration {
            message: format!("Invalid password hashing parameters: {}", e),
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> ApiResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt_bytes);

        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| ApiError::InternalServerError {
            message: format!("Failed to encode password salt: {}", e),
        })?;

        let hash = self.argon2().hash_password(plaintext.as_bytes(), &salt).map_err(|e| ApiError::InternalServerError {
            message: format!("Password hashing failed: {}", e),
        })?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };

        // Parameters come from the stored string, so hashes made with an
        // older work factor still verify.
        self.argon2().verify_password(plaintext.as_bytes(), &parsed).is_ok()
    }
}

/// Hash on the blocking pool so request tasks are not stalled
pub async fn hash_password(hasher: Arc<dyn PasswordHasher>, plaintext: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .map_err(|e| ApiError::InternalServerError {
            message: format!("Password hashing task failed: {}", e),
        })?
}

/// Verify on the blocking pool; a failed task counts as a mismatch
pub async fn verify_password(hasher: Arc<dyn PasswordHasher>, plaintext: String, stored: String) -> bool {
    tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored)).await.unwrap_or(false)
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Argon2Hasher {
    Argon2Hasher::new(HashCost {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = test_hasher();
        let stored = hasher.hash("secret1").unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &stored));
        assert!(!hasher.verify("secret2", &stored));
    }

    #[test]
    fn test_salts_differ_per_hash() {
        let hasher = test_hasher();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("same-password", &a));
        assert!(hasher.verify("same-password", &b));
    }

    #[test]
    fn test_malformed_stored_form_fails_closed() {
        let hasher = test_hasher();

        assert!(!hasher.verify("secret1", ""));
        assert!(!hasher.verify("secret1", "not-a-hash"));
        assert!(!hasher.verify("secret1", "deadbeef:"));
        assert!(!hasher.verify("secret1", "$argon2id$v=19$m=64,t=1,p=1$"));
    }

    #[test]
    fn test_stored_form_from_other_cost_still_verifies() {
        let stored = test_hasher().hash("portable").unwrap();
        let stronger = Argon2Hasher::new(HashCost {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(stronger.verify("portable", &stored));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let result = Argon2Hasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(ApiError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_async_helpers() {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(test_hasher());
        let stored = hash_password(hasher.clone(), "async-secret".to_string()).await.unwrap();

        assert!(verify_password(hasher.clone(), "async-secret".to_string(), stored.clone()).await);
        assert!(!verify_password(hasher, "wrong".to_string(), stored).await);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_password_round_trip(p1 in ".{1,32}", p2 in ".{1,32}") {
            let hasher = test_hasher();
            let stored = hasher.hash(&p1).unwrap();
            prop_assert!(hasher.verify(&p1, &stored));
            if p1 != p2 {
                prop_assert!(!hasher.verify(&p2, &stored));
            }
        }
    }
}
