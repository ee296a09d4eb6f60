//! Process configuration loaded once at startup from environment variables (§6),
//! analogous to the teacher's `GameConfig.json` hot-reload but for process env.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Optional persistence credential; absence disables the persistence adapter (§6).
    pub firebase_service_account_json: Option<String>,
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
    pub reconnect_grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3001,
            allowed_origins: vec!["*".to_string()],
            firebase_service_account_json: None,
            heartbeat_interval: Duration::from_secs(30),
            client_timeout: Duration::from_secs(45),
            reconnect_grace_period: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Reads `PORT`, `HOST`, `ALLOWED_ORIGINS`, `FIREBASE_SERVICE_ACCOUNT_JSON` from the
    /// process environment, falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or(defaults.allowed_origins);
        let firebase_service_account_json = env::var("FIREBASE_SERVICE_ACCOUNT_JSON").ok();

        Config {
            host,
            port,
            allowed_origins,
            firebase_service_account_json,
            ..defaults
        }
    }

    /// Origin allow-list check: exact match, prefix match (entry ending `*`), wildcard
    /// entry `*`, or an absent/empty origin header is always accepted (§4.5, §6).
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };
        if origin.is_empty() {
            return true;
        }
        self.allowed_origins.iter().any(|allowed| {
            if allowed == "*" {
                true
            } else if let Some(prefix) = allowed.strip_suffix('*') {
                origin.starts_with(prefix)
            } else {
                allowed == origin
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_accepts_anything() {
        let cfg = Config { allowed_origins: vec!["*".to_string()], ..Config::default() };
        assert!(cfg.origin_allowed(Some("https://evil.example")));
        assert!(cfg.origin_allowed(None));
    }

    #[test]
    fn prefix_match() {
        let cfg = Config {
            allowed_origins: vec!["https://example.*".to_string()],
            ..Config::default()
        };
        assert!(cfg.origin_allowed(Some("https://example.com")));
        assert!(!cfg.origin_allowed(Some("https://notexample.com")));
    }

    #[test]
    fn empty_origin_always_allowed() {
        let cfg = Config { allowed_origins: vec!["https://only.example".to_string()], ..Config::default() };
        assert!(cfg.origin_allowed(Some("")));
    }

    #[test]
    fn exact_match_rejects_mismatch() {
        let cfg = Config { allowed_origins: vec!["https://only.example".to_string()], ..Config::default() };
        assert!(cfg.origin_allowed(Some("https://only.example")));
        assert!(!cfg.origin_allowed(Some("https://other.example")));
    }
}
