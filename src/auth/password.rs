//! Adaptive password hashing via bcrypt.

use crate::error::AppError;

/// Work factor for stored passwords.
const COST: u32 = 12;

/// Replace a plaintext password with its one-way hash before persistence.
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(plaintext, COST)?)
}

/// Compare a candidate against the stored hash. Mismatch and malformed hashes
/// both read as a plain `false`; this never errors.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    bcrypt::verify(candidate, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // lower cost keeps the test suite fast; the verify path is cost-agnostic
    fn quick_hash(plaintext: &str) -> String {
        bcrypt::hash(plaintext, 4).unwrap()
    }

    #[test]
    fn hash_verifies_and_is_not_plaintext() {
        let hash = quick_hash("correct-horse");
        assert_ne!(hash, "correct-horse");
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
    }

    #[test]
    fn malformed_hash_reads_as_false_not_error() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", ""));
    }
}
