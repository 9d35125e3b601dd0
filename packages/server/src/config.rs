use config::{Config, ConfigError, Environment, File};
use registry_common::config::StorageConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Public base URL used to build `Location` headers.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Realm announced in `WWW-Authenticate` challenges.
    pub realm: String,
    /// User created at startup when both fields are set.
    pub bootstrap_username: Option<String>,
    pub bootstrap_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// Config file location, without extension. Overridden by `REGISTRY_CONFIG`.
const DEFAULT_CONFIG_PATH: &str = "config/config";

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("REGISTRY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("registry.base_url", "http://localhost:8080")?
            .set_default("auth.realm", "Cirrus Registry")?
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., REGISTRY__DATABASE__URL)
            .add_source(Environment::with_prefix("REGISTRY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Credentials of the bootstrap user, if fully configured.
    pub fn bootstrap_user(&self) -> Option<(&str, &str)> {
        match (&self.auth.bootstrap_username, &self.auth.bootstrap_password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }
}
