use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::{env, sync::OnceLock};

const DEFAULT_CSP_POLICY: &str = "default-src 'self'; base-uri 'self'; form-action 'self'; frame-ancestors 'none'; object-src 'none'; img-src 'self' data:";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

const STATIC_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "same-origin"),
    ("cross-origin-opener-policy", "same-origin"),
];

#[derive(Debug, Clone)]
struct SecurityHeadersConfig {
    csp: HeaderValue,
    enable_hsts: bool,
}

impl SecurityHeadersConfig {
    fn from_env() -> Self {
        let csp = env::var("CSP_POLICY")
            .ok()
            .and_then(|raw| match HeaderValue::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!("Invalid CSP_POLICY value ({err}), using the default policy");
                    None
                }
            })
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CSP_POLICY));

        Self {
            csp,
            enable_hsts: crate::config::parse_bool_env("ENABLE_HSTS", false),
        }
    }
}

fn security_headers_config() -> &'static SecurityHeadersConfig {
    static CONFIG: OnceLock<SecurityHeadersConfig> = OnceLock::new();
    CONFIG.get_or_init(SecurityHeadersConfig::from_env)
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let config = security_headers_config();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("content-security-policy", config.csp.clone());
    for (name, value) in STATIC_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    if config.enable_hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}
