use std::env;

/// Token bucket settings for one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Route groups that get their own limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Signup, login, logout.
    Accounts,
    /// Feeds and post pages.
    Browse,
    /// Create/edit and admin writes.
    Write,
}

impl RouteGroup {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "accounts" => Some(Self::Accounts),
            "browse" => Some(Self::Browse),
            "write" => Some(Self::Write),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub accounts: RateLimitRule,
    pub browse: RateLimitRule,
    pub write: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            accounts: RateLimitRule::new(5, 10),
            browse: RateLimitRule::new(30, 60),
            write: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_ENABLED` toggles limiting; `RATE_LIMIT_CONFIG` is either a
    /// single `per:burst` applied everywhere or a list such as
    /// `accounts=5:10,browse=30:60,write=10:20`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = super::parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            match parse_overrides(&raw) {
                Ok(overrides) => {
                    for (group, rule) in overrides {
                        cfg.set(group, rule);
                    }
                }
                Err(err) => {
                    tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                }
            }
        }

        cfg
    }

    pub fn rule(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Accounts => self.accounts,
            RouteGroup::Browse => self.browse,
            RouteGroup::Write => self.write,
        }
    }

    fn set(&mut self, group: Option<RouteGroup>, rule: RateLimitRule) {
        match group {
            None => {
                self.accounts = rule;
                self.browse = rule;
                self.write = rule;
            }
            Some(RouteGroup::Accounts) => self.accounts = rule,
            Some(RouteGroup::Browse) => self.browse = rule,
            Some(RouteGroup::Write) => self.write = rule,
        }
    }
}

/// Parse the override string into `(group, rule)` pairs; a `None` group means
/// "every group". Later entries win.
fn parse_overrides(raw: &str) -> Result<Vec<(Option<RouteGroup>, RateLimitRule)>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    if !trimmed.contains('=') {
        return Ok(vec![(None, parse_rule(trimmed)?)]);
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, raw_rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group = RouteGroup::parse(name).ok_or_else(|| {
                format!(
                    "unknown group '{}', expected accounts/browse/write",
                    name.trim()
                )
            })?;
            Ok((Some(group), parse_rule(raw_rule.trim())?))
        })
        .collect()
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
