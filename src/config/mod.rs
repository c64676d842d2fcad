use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub credits: CreditConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: String,
    /// Files above this size are rejected; an external storage backend
    /// would take them instead if one were configured.
    pub max_file_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreditConfig {
    /// Amount handed out by the periodic distribute-to-all batch.
    pub monthly_allotment: i64,
    /// Starting balance granted when an account is first seeded.
    pub registration_grant: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            monthly_allotment: 100,
            registration_grant: 50,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("uploads.dir", "uploads")?
            .set_default("uploads.max_file_bytes", 10 * 1024 * 1024)?
            .set_default("credits.monthly_allotment", 100)?
            .set_default("credits.registration_grant", 50)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with ATRIUM__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ATRIUM").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://atrium.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
            },
            uploads: UploadConfig::default(),
            credits: CreditConfig::default(),
        }
    }
}
