//! Environment-driven settings. Bad values fall back to defaults with a warning.

use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub lock_timeout: Duration,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr);

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let lock_timeout_ms = parse_or("LOCK_TIMEOUT_MS", lookup("LOCK_TIMEOUT_MS"), DEFAULT_LOCK_TIMEOUT_MS);
        let lock_timeout = if lock_timeout_ms == 0 {
            tracing::warn!("LOCK_TIMEOUT_MS must be positive; using {DEFAULT_LOCK_TIMEOUT_MS}");
            defaults.lock_timeout
        } else {
            Duration::from_millis(lock_timeout_ms)
        };

        let seed_demo_data = parse_or("SEED_DEMO_DATA", lookup("SEED_DEMO_DATA"), defaults.seed_demo_data);

        Self {
            bind_addr,
            jwt_secret,
            lock_timeout,
            seed_demo_data,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            seed_demo_data: true,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(key, value = %raw, fallback = ?default, "invalid config value");
            default
        }
    }
}
