use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

pub const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Clone)]
struct SessionCookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl SessionCookieConfig {
    fn from_env() -> Self {
        let same_site = parse_same_site(
            &env::var("AUTH_COOKIE_SAMESITE").unwrap_or_else(|_| "Lax".to_string()),
        );
        let domain = env::var("AUTH_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Browsers drop SameSite=None cookies that are not Secure.
        let secure =
            same_site == "None" || crate::config::parse_bool_env("AUTH_COOKIE_SECURE", false);

        Self {
            secure,
            same_site,
            domain,
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!("Path=/; HttpOnly; SameSite={}", self.same_site);
        if self.secure {
            attrs.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            attrs.push_str("; Domain=");
            attrs.push_str(domain);
        }
        attrs
    }
}

fn cookie_config() -> &'static SessionCookieConfig {
    static CONFIG: OnceLock<SessionCookieConfig> = OnceLock::new();
    CONFIG.get_or_init(SessionCookieConfig::from_env)
}

fn parse_same_site(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn build_session_cookie(token: &str, max_age_seconds: u64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Max-Age={max_age_seconds}; {}",
        cookie_config().attributes()
    )
}

/// `Set-Cookie` value that makes the browser forget the session.
pub fn build_clear_cookie() -> String {
    format!(
        "{SESSION_COOKIE}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; {}",
        cookie_config().attributes()
    )
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_header| cookie_header.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}
