//! Opaque password-reset tokens: random plaintext out-of-band, hash at rest.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minutes until a freshly issued reset token expires.
const RESET_TTL_MINUTES: i64 = 10;

pub struct ResetToken {
    /// Sent to the user, never stored.
    pub plaintext: String,
    /// The only form that touches the database.
    pub hashed: String,
    pub expires_at: DateTime<Utc>,
}

/// 32 cryptographically random bytes, hex-encoded. The caller persists
/// `hashed` and `expires_at` and sends `plaintext` out-of-band.
pub fn issue_reset_token() -> ResetToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    let hashed = hash_reset_token(&plaintext);
    ResetToken {
        plaintext,
        hashed,
        expires_at: Utc::now() + Duration::minutes(RESET_TTL_MINUTES),
    }
}

/// SHA-256 hex of the plaintext, used both at issuance and at lookup.
pub fn hash_reset_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_hash_matches_what_is_persisted() {
        let token = issue_reset_token();
        assert_ne!(token.plaintext, token.hashed);
        assert_eq!(hash_reset_token(&token.plaintext), token.hashed);
        assert_eq!(token.plaintext.len(), 64); // 32 bytes hex
        assert_eq!(token.hashed.len(), 64); // sha-256 hex
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let token = issue_reset_token();
        let ttl = token.expires_at - Utc::now();
        assert!(ttl <= Duration::minutes(10));
        assert!(ttl > Duration::minutes(9));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(issue_reset_token().plaintext, issue_reset_token().plaintext);
    }
}
