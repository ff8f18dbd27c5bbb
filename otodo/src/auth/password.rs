//! Salted SHA-256 password digests.
//!
//! The salt is a single process-wide secret rather than a per-user value, so
//! digests stay byte-compatible with accounts created by earlier deployments.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct PasswordHasher {
    salt: Vec<u8>,
}

impl PasswordHasher {
    pub fn new(salt: impl AsRef<[u8]>) -> Self {
        Self {
            salt: salt.as_ref().to_vec(),
        }
    }

    /// SHA-256 over `password ‖ salt`
    pub fn hash(&self, password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(&self.salt);
        hasher.finalize().to_vec()
    }

    /// Constant-time comparison of `hash(candidate)` against a stored digest
    pub fn verify(&self, candidate: &str, digest: &[u8]) -> bool {
        self.hash(candidate).ct_eq(digest).into()
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}
