//! Connection configuration.

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

/// Character set settings applied to the database on connect.
#[derive(Debug, Clone, Deserialize)]
pub struct CharsetConfig {
    /// Charset name, e.g. `utf8mb4`.
    pub name: String,
    /// Collation name, e.g. `utf8mb4_general_ci`.
    pub collation: String,
}

/// Typed connection configuration consumed by the executor.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// User name.
    #[serde(default = "default_user")]
    pub user: String,
    /// Password.
    pub password: String,
    /// Database (schema) name.
    pub database: String,
    /// Optional charset to enforce on connect.
    #[serde(default)]
    pub charset: Option<CharsetConfig>,
    /// Whether to keep retrying after a failed connection attempt.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    /// Fixed delay between connection attempts, in seconds.
    #[serde(default = "default_delay")]
    pub auto_connect_delay_secs: u64,
    /// Upper bound on connection attempts; `None` retries indefinitely
    /// while `auto_connect` is set.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    String::from("root")
}

fn default_true() -> bool {
    true
}

fn default_delay() -> u64 {
    5
}

impl DatabaseConfig {
    /// Creates a config with default host/port/user and retry policy.
    #[must_use]
    pub fn new(database: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: password.into(),
            database: database.into(),
            charset: None,
            auto_connect: default_true(),
            auto_connect_delay_secs: default_delay(),
            max_attempts: None,
        }
    }

    /// Builds the sqlx connect options. Credentials travel as discrete
    /// fields, never through a URL, so no character in them needs escaping.
    #[must_use]
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DatabaseConfig::new("shop", "secret");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.user, "root");
        assert!(config.auto_connect);
        assert_eq!(config.auto_connect_delay_secs, 5);
    }

    #[test]
    fn special_characters_in_credentials_survive() {
        use sqlx::ConnectOptions;

        let mut config = DatabaseConfig::new("shop", "p@ss/w%rd#1");
        config.user = String::from("app@backend");
        let url = config.connect_options().to_url_lossy();
        // The authority stays intact regardless of what the credentials
        // contain, since nothing is spliced into a URL.
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(3306));
        assert_eq!(url.path(), "/shop");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DatabaseConfig = serde_json::from_str(
            r#"{"password": "secret", "database": "shop", "max_attempts": 3}"#,
        )
        .unwrap();
        assert_eq!(config.database, "shop");
        assert_eq!(config.max_attempts, Some(3));
        assert!(config.charset.is_none());
    }
}
