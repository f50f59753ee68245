use infrastructure::DEFAULT_DATABASE_NAME;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8000;

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_name: String,
    /// Reported as ignored while the store is in-memory; nothing dials out.
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Reads `PORT`, `DATABASE_NAME` and `DATABASE_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(port_str) => match u16::from_str(port_str.trim()) {
                Ok(port_num) => {
                    info!("Using port {} from environment variable PORT.", port_num);
                    port_num
                }
                Err(_) => {
                    warn!(
                        "Invalid PORT value '{}' in environment variable. Using default port {}.",
                        port_str, DEFAULT_PORT
                    );
                    DEFAULT_PORT
                }
            },
            None => {
                info!(
                    "PORT environment variable not set. Using default port {}.",
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        };

        let database_name = lookup("DATABASE_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Self {
            port,
            database_name,
            database_url,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            database_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]), ServerConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("DATABASE_NAME", "ngo"),
            ("DATABASE_URL", "mongodb://localhost:27017"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_name, "ngo");
        assert_eq!(config.database_url.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.bind_addr().port(), 9090);
    }

    #[test]
    fn invalid_port_falls_back() {
        assert_eq!(config_from(&[("PORT", "http")]).port, DEFAULT_PORT);
        assert_eq!(config_from(&[("PORT", "70000")]).port, DEFAULT_PORT);
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config_from(&[("DATABASE_NAME", "  "), ("DATABASE_URL", "")]);
        assert_eq!(config.database_name, DEFAULT_DATABASE_NAME);
        assert!(config.database_url.is_none());
    }
}
