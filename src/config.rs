/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Upper bound on matches held in memory at once.
    pub max_matches: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            max_matches: std::env::var("LIVE_CHESS_MAX_MATCHES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_matches),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            max_matches: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8082);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_matches, 1000);
        assert_eq!(config.bind_addr(), "0.0.0.0:8082");
    }

    #[test]
    fn from_env_defaults() {
        // Without the variables set, values fall back to the defaults.
        let config = AppConfig::from_env();
        assert_eq!(config.max_matches, 1000);
    }
}
