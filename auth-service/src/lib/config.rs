use std::env;

use auth::Secret;
use auth::TokenLifetimes;
use auth::WorkFactor;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Users are kept in memory when unset.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: Secret,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl JwtConfig {
    pub fn token_lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: chrono::Duration::minutes(self.access_token_ttl_minutes),
            refresh: chrono::Duration::days(self.refresh_token_ttl_days),
        }
    }
}

/// Argon2id work factor used for new password hashes.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let work_factor = WorkFactor::default();
        Self {
            memory_kib: work_factor.memory_kib,
            iterations: work_factor.iterations,
            parallelism: work_factor.parallelism,
        }
    }
}

impl From<&PasswordConfig> for WorkFactor {
    fn from(config: &PasswordConfig) -> Self {
        WorkFactor {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (AUTH__JWT__SECRET, AUTH__DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = Self::with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: AUTH__JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("AUTH").separator("__"))
            .build()?;

        Self::from_configuration(configuration)
    }

    fn with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        ConfigBuilder::builder()
            .set_default("server.http_port", 3000)?
            .set_default("jwt.access_token_ttl_minutes", 15)?
            .set_default("jwt.refresh_token_ttl_days", 7)
    }

    fn from_configuration(configuration: ConfigBuilder) -> Result<Self, ConfigError> {
        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.jwt.access_token_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "jwt.access_token_ttl_minutes must be positive".into(),
            ));
        }
        if self.jwt.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::Message(
                "jwt.refresh_token_ttl_days must be positive".into(),
            ));
        }

        Ok(())
    }
}
