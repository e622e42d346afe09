use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Session lifetime in seconds.
    pub session_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters"
            ));
        }

        let session_expiry = env::var("JWT_ACCESS_EXPIRATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1_209_600); // two weeks

        Ok(Self {
            secret,
            session_expiry,
        })
    }
}
