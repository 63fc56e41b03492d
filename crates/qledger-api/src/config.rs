//! API configuration.

use std::time::Duration;

/// Which account store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local map, lost on restart.
    #[default]
    Memory,
    /// Remote REST table.
    Rest,
}

impl StoreBackend {
    /// Parse a backend name. Unknown names fall back to memory.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "rest" | "remote" => StoreBackend::Rest,
            _ => StoreBackend::Memory,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Rest => "rest",
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Account store backend
    pub store: StoreBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            metrics_enabled: true,
            store: StoreBackend::Memory,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            store: std::env::var("ACCOUNT_STORE")
                .map(|s| StoreBackend::from_str(&s))
                .unwrap_or_default(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        is_production_environment(&self.environment)
    }
}

/// Whether an `ENVIRONMENT` value names production. Case-insensitive.
pub fn is_production_environment(environment: &str) -> bool {
    environment.trim().eq_ignore_ascii_case("production")
}

/// Production check against the live `ENVIRONMENT` variable.
pub fn running_in_production() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| is_production_environment(&env))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "API_HOST",
        "API_PORT",
        "CORS_ORIGINS",
        "RATE_LIMIT_RPS",
        "REQUEST_TIMEOUT",
        "MAX_BODY_SIZE",
        "ENVIRONMENT",
        "METRICS_ENABLED",
        "ACCOUNT_STORE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_production_check_ignores_case() {
        assert!(is_production_environment("production"));
        assert!(is_production_environment("Production"));
        assert!(is_production_environment(" PRODUCTION "));
        assert!(!is_production_environment("staging"));
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.metrics_enabled);
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn test_reads_env_overrides() {
        clear_env();
        std::env::set_var("API_PORT", "9100");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example,");
        std::env::set_var("REQUEST_TIMEOUT", "5");
        std::env::set_var("ENVIRONMENT", "Production");
        std::env::set_var("METRICS_ENABLED", "false");
        std::env::set_var("ACCOUNT_STORE", "REST");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 9100);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.is_production());
        assert!(!config.metrics_enabled);
        assert_eq!(config.store, StoreBackend::Rest);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        clear_env();
        std::env::set_var("API_PORT", "eighty");
        std::env::set_var("RATE_LIMIT_RPS", "-3");
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.rate_limit_rps, 10);
        clear_env();
    }
}
