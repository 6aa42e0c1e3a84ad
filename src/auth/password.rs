//! Password digests
//!
//! Digests are Argon2id (version 0x13) PHC strings:
//! `$argon2id$v=19$m=<KiB>,t=<iterations>,p=<lanes>$<salt>$<hash>`.
//! The parameters used for a digest are stored inside it, so verification
//! keeps working after the configured parameters are raised. Changing the
//! algorithm itself requires re-digesting every stored password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::constants::{
    DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
};
use crate::error::{Result, RosterError};

/// Cost parameters for new digests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for DigestParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

impl DigestParams {
    /// Cheapest parameters Argon2 accepts. Only for tests and local tooling.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Produces and checks password digests
#[derive(Clone)]
pub struct PasswordDigester {
    argon2: Argon2<'static>,
}

impl PasswordDigester {
    pub fn new(params: DigestParams) -> Result<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| RosterError::ConfigError(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Digest a plaintext password with a fresh random salt
    pub fn digest(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| RosterError::DigestError(e.to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// The final hash comparison is constant time. A malformed stored digest
    /// never verifies.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Stored password digest is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digester() -> PasswordDigester {
        PasswordDigester::new(DigestParams::minimal()).unwrap()
    }

    #[test]
    fn test_digest_verifies() {
        let digester = digester();
        let digest = digester.digest("pw1").unwrap();

        assert!(digest.starts_with("$argon2id$v=19$"));
        assert!(digester.verify("pw1", &digest));
        assert!(!digester.verify("pw2", &digest));
    }

    #[test]
    fn test_digests_are_salted() {
        let digester = digester();
        assert_ne!(digester.digest("same").unwrap(), digester.digest("same").unwrap());
    }

    #[test]
    fn test_params_are_read_from_digest() {
        let old = digester().digest("pw1").unwrap();
        let stronger = PasswordDigester::new(DigestParams {
            memory_kib: 64,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();

        assert!(stronger.verify("pw1", &old));
    }

    #[test]
    fn test_malformed_digest_never_verifies() {
        let digester = digester();
        // An unsalted SHA-256 hex digest is not accepted
        let sha256_of_123 = "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3";
        assert!(!digester.verify("123", sha256_of_123));
        assert!(!digester.verify("", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordDigester::new(DigestParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(RosterError::ConfigError(_))));
    }
}
