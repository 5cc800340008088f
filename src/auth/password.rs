use crate::types::{AppError, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Argon2id password hashing.
///
/// Plaintext is trimmed before hashing and before verification, so stray
/// whitespace from form input never changes the effective secret. The hasher
/// holds only immutable cost parameters and is cheap to clone.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with explicit Argon2 cost parameters.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes over memory
    /// * `parallelism` - Degree of parallelism (lanes)
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::Internal(format!("Invalid argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password using Argon2id with a fresh random salt.
    ///
    /// Returns a PHC-formatted hash string.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.trim();
        if plaintext.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Verifies a password against a PHC hash. Never errors: malformed
    /// digests, empty input and backend failures all count as a mismatch.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let plaintext = plaintext.trim();
        if plaintext.is_empty() {
            return false;
        }

        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        // Cost parameters come from the digest itself, so hashes made under
        // an older configuration still verify.
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                tracing::warn!("Password verification backend failure: {}", e);
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String> {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(&self, plaintext: &str, digest: &str) -> bool {
        let hasher = self.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        match tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!("Verification task failed: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).expect("valid params")
    }

    #[test]
    fn test_password_hashing() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("test_password_123").expect("should hash password");

        assert_ne!(hash, "test_password_123");
        assert!(hash.starts_with("$argon2id"), "hash should be in PHC format");
    }

    #[test]
    fn test_password_verification_success() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("secure_password_456").expect("should hash");

        assert!(hasher.verify("secure_password_456", &hash));
    }

    #[test]
    fn test_password_verification_failure() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("correct_password").expect("should hash");

        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = create_test_hasher();
        let first = hasher.hash("secret1").expect("should hash");
        let second = hasher.hash("secret1").expect("should hash");

        assert_ne!(first, second, "same plaintext should yield different digests");
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("  secret1\n").expect("should hash");

        assert!(hasher.verify("secret1", &hash));
        assert!(hasher.verify("\tsecret1 ", &hash));
        assert!(!hasher.verify("secret 1", &hash));
    }

    #[test]
    fn test_empty_password_cannot_be_hashed() {
        let hasher = create_test_hasher();
        assert!(matches!(hasher.hash("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_verify_never_errors() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("secret1").expect("should hash");

        assert!(!hasher.verify("", &hash));
        assert!(!hasher.verify("secret1", "not-a-phc-string"));
        assert!(!hasher.verify("secret1", ""));
        assert!(!hasher.verify("secret1", "$argon2id$v=19$m=1024,t=1,p=1$broken"));
    }

    #[test]
    fn test_hash_from_other_cost_still_verifies() {
        let cheap = create_test_hasher();
        let other = PasswordHasher::new(2048, 2, 1).expect("valid params");
        let hash = cheap.hash("secret1").expect("should hash");

        assert!(other.verify("secret1", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(PasswordHasher::new(0, 0, 0).is_err());
    }

    #[tokio::test]
    async fn test_blocking_offload_round_trip() {
        let hasher = create_test_hasher();
        let hash = hasher.hash_blocking("secret1").await.expect("should hash");

        assert!(hasher.verify_blocking("secret1", &hash).await);
        assert!(!hasher.verify_blocking("secret2", &hash).await);
    }
}
