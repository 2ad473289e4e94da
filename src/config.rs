//! Startup configuration, read from the environment.
//!
//! | variable | default |
//! |---|---|
//! | `FOXNAVY_SECRET` | required |
//! | `FOXNAVY_SESSION_MAX_AGE` | `86400` (seconds) |
//! | `FOXNAVY_SECURE_COOKIES` | `false` |
//! | `FOXNAVY_BIND` | `127.0.0.1:3030` |

use std::net::SocketAddr;
use std::time::Duration;

use foxnavy_protocol::{SecretError, SessionSecret};

pub const SECRET_VAR: &str = "FOXNAVY_SECRET";
pub const MAX_AGE_VAR: &str = "FOXNAVY_SESSION_MAX_AGE";
pub const SECURE_COOKIES_VAR: &str = "FOXNAVY_SECURE_COOKIES";
pub const BIND_VAR: &str = "FOXNAVY_BIND";

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 3030);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("FOXNAVY_SECRET is not set")]
    MissingSecret,
    #[error("FOXNAVY_SECRET: {0}")]
    Secret(#[from] SecretError),
    #[error("FOXNAVY_SESSION_MAX_AGE must be a positive number of seconds, got {0:?}")]
    InvalidMaxAge(String),
    #[error("{key} must be true or false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },
    #[error("FOXNAVY_BIND must be a socket address, got {0:?}")]
    InvalidBind(String),
}

/// How long sessions last and how their cookies are flagged.
/// Shared by token verification and `Set-Cookie`, so the two always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub max_age: Duration,
    /// Adds `Secure` to the session cookie. Enable behind TLS.
    pub secure_cookies: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60),
            secure_cookies: false,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub bind: SocketAddr,
    pub secret: SessionSecret,
    pub policy: SessionPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup(SECRET_VAR).ok_or(ConfigError::MissingSecret)?;
        let secret = SessionSecret::from_passphrase(&secret)?;

        let mut policy = SessionPolicy::default();
        if let Some(value) = lookup(MAX_AGE_VAR) {
            policy.max_age = match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidMaxAge(value)),
            };
        }
        if let Some(value) = lookup(SECURE_COOKIES_VAR) {
            policy.secure_cookies = parse_flag(SECURE_COOKIES_VAR, value)?;
        }

        let bind = match lookup(BIND_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBind(value))?,
            None => SocketAddr::from(DEFAULT_BIND),
        };

        Ok(Self {
            bind,
            secret,
            policy,
        })
    }

    /// Settings that are valid but unsafe for a public deployment
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.policy.secure_cookies {
            warnings.push(format!(
                "Session cookies are sent without Secure, set {}=true behind TLS",
                SECURE_COOKIES_VAR
            ));
        }
        warnings
    }
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            load(&[(SECRET_VAR, "")]),
            Err(ConfigError::Secret(SecretError::Empty))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(SECRET_VAR, "hunter2")]).unwrap();
        assert_eq!(config.policy, SessionPolicy::default());
        assert_eq!(config.bind, "127.0.0.1:3030".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (SECRET_VAR, "hunter2"),
            (MAX_AGE_VAR, "3600"),
            (SECURE_COOKIES_VAR, "TRUE"),
            (BIND_VAR, "0.0.0.0:8080"),
        ])
        .unwrap();
        assert_eq!(config.policy.max_age, Duration::from_secs(3600));
        assert!(config.policy.secure_cookies);
        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn insecure_cookies_are_warned_about() {
        let config = load(&[(SECRET_VAR, "x")]).unwrap();
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains(SECURE_COOKIES_VAR));

        let config = load(&[(SECRET_VAR, "x"), (SECURE_COOKIES_VAR, "1")]).unwrap();
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[(SECRET_VAR, "x"), (MAX_AGE_VAR, "0")]),
            Err(ConfigError::InvalidMaxAge(_))
        ));
        assert!(matches!(
            load(&[(SECRET_VAR, "x"), (MAX_AGE_VAR, "a week")]),
            Err(ConfigError::InvalidMaxAge(_))
        ));
        assert!(matches!(
            load(&[(SECRET_VAR, "x"), (SECURE_COOKIES_VAR, "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
        assert!(matches!(
            load(&[(SECRET_VAR, "x"), (BIND_VAR, "localhost")]),
            Err(ConfigError::InvalidBind(_))
        ));
    }
}
