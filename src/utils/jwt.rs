use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<crate::config::jwt::JwtConfig> = OnceLock::new();

/// Initialize JWT config. Must be called once at startup.
pub fn init_jwt_config(config: crate::config::jwt::JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static crate::config::jwt::JwtConfig> {
    JWT_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("JWT config not initialized"))
}

/// Lifetime of a session token, in seconds.
pub fn session_expiry() -> u64 {
    get_config().map(|c| c.session_expiry).unwrap_or(0)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,
    pub iat: usize,
}

pub fn encode_session_token(user_id: i32) -> Result<String> {
    let config = get_config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + config.session_expiry as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))
}

pub fn decode_session_token(token: &str) -> Result<Claims> {
    let config = get_config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let config = crate::config::jwt::JwtConfig {
                secret: "a_very_long_secret_key_that_is_at_least_32_chars".to_string(),
                session_expiry: 3600,
            };
            let _ = init_jwt_config(config);
        });
    }

    #[test]
    fn encode_decode_round_trip() {
        ensure_config();
        let token = encode_session_token(42).unwrap();
        let claims = decode_session_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = encode_session_token(42).unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_session_token(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let config = get_config().unwrap();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_session_token(&token).is_err());
    }

    #[test]
    fn empty_token_fails() {
        ensure_config();
        assert!(decode_session_token("").is_err());
    }
}
