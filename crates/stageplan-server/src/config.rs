use std::net::IpAddr;

/// Server configuration, loaded from environment variables.
///
/// Database connection is built from individual variables:
/// - `SP_DB_HOST` (required) - Database hostname
/// - `SP_DB_PORT` (optional, default: 5432) - Database port
/// - `SP_DB_NAME` (required) - Database name
/// - `SP_DB_USER` (required) - Database username
/// - `SP_DB_PASSWORD` (required) - Database password
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    /// Allowed CORS origins (comma-separated). If empty, defaults to restrictive.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| format!("{key} environment variable is required"))
        };

        let db_host = require("SP_DB_HOST")?;
        let db_port = lookup("SP_DB_PORT").unwrap_or_else(|| "5432".to_string());
        let db_name = require("SP_DB_NAME")?;
        let db_user = require("SP_DB_USER")?;
        let db_password = require("SP_DB_PASSWORD")?;

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_password, db_host, db_port, db_name
        );

        let host: IpAddr = lookup("SP_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .map_err(|_| "SP_HOST must be a valid IP address".to_string())?;

        let port: u16 = lookup("SP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| "SP_PORT must be a valid port number".to_string())?;

        let cors_origins: Vec<String> = lookup("SP_CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            database_url,
            cors_origins,
        })
    }
}
