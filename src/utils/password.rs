use anyhow::{Context, Result};
use std::{env, sync::OnceLock};

/// bcrypt work factor, `BCRYPT_COST` or the library default. Values outside
/// bcrypt's accepted 4..=31 range fall back to the default.
fn cost() -> u32 {
    static COST: OnceLock<u32> = OnceLock::new();
    *COST.get_or_init(|| {
        env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|c| (4..=31).contains(c))
            .unwrap_or(bcrypt::DEFAULT_COST)
    })
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, cost()).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn salted_hashes_differ() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-bcrypt-hash").is_err());
    }
}
