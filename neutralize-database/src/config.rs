use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::NeutralizeError;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "DB_HOST", default = "localhost")]
    pub db_host: String,

    #[envconfig(from = "DB_PORT", default = "5432")]
    pub db_port: u16,

    #[envconfig(from = "DB_USER", default = "odoo")]
    pub db_user: String,

    #[envconfig(from = "DB_PASSWORD")]
    pub db_password: Option<String>,

    // disable, allow, prefer, require, verify-ca or verify-full
    #[envconfig(from = "DB_SSLMODE", default = "prefer")]
    pub db_sslmode: String,

    #[envconfig(from = "DB_CONNECT_TIMEOUT_SECS", default = "10")]
    pub db_connect_timeout_secs: u64,

    // Comma separated, searched in order for `<module>/data/neutralize.sql`.
    #[envconfig(from = "ADDONS_PATH")]
    pub addons_path: Option<String>,

    // Only used to rebuild `web.base.url` when the identity is regenerated.
    #[envconfig(from = "HTTP_PORT", default = "8069")]
    pub http_port: u16,
}

impl Config {
    /// Connection options for `db_name` on the configured server.
    pub fn connect_options(&self, db_name: &str) -> Result<PgConnectOptions, NeutralizeError> {
        let ssl_mode = PgSslMode::from_str(&self.db_sslmode).map_err(|_| {
            NeutralizeError::InvalidConfig(format!("unknown DB_SSLMODE: {}", self.db_sslmode))
        })?;

        let mut options = PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .database(db_name)
            .ssl_mode(ssl_mode)
            .application_name("neutralize-database");

        if let Some(password) = &self.db_password {
            options = options.password(password);
        }

        Ok(options)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }

    pub fn addons_paths(&self) -> Vec<std::path::PathBuf> {
        self.addons_path
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(std::path::PathBuf::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&env).expect("failed to build config")
    }

    #[test]
    fn defaults_match_a_local_odoo_install() {
        let config = config_from(&[]);

        assert_eq!(config.db_host, "localhost");
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_user, "odoo");
        assert_eq!(config.db_password, None);
        assert_eq!(config.http_port, 8069);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.addons_paths().is_empty());
    }

    #[test]
    fn connect_options_target_the_requested_database() {
        let config = config_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6432"),
            ("DB_USER", "staging"),
            ("DB_PASSWORD", "hunter2"),
        ]);

        let options = config
            .connect_options("acme_staging")
            .expect("options should build");

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_username(), "staging");
        assert_eq!(options.get_database(), Some("acme_staging"));
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        let config = config_from(&[("DB_SSLMODE", "sometimes")]);

        let err = config.connect_options("acme").unwrap_err();

        assert!(matches!(err, NeutralizeError::InvalidConfig(_)));
    }

    #[test]
    fn addons_path_is_split_and_trimmed() {
        let config = config_from(&[("ADDONS_PATH", "/opt/odoo/addons, /opt/custom,,")]);

        assert_eq!(
            config.addons_paths(),
            vec![
                std::path::PathBuf::from("/opt/odoo/addons"),
                std::path::PathBuf::from("/opt/custom"),
            ]
        );
    }

    #[test]
    fn invalid_port_fails_to_load() {
        let env: HashMap<String, String> =
            HashMap::from([("DB_PORT".to_string(), "not-a-port".to_string())]);

        assert!(Config::init_from_hashmap(&env).is_err());
    }
}
