use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// How many one-second attempts `all` makes while waiting for a fresh container.
    pub connect_attempts: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub signin_attempts_per_minute: u32,
}

impl AuthConfig {
    /// Only HMAC algorithms make sense with a shared secret key.
    pub fn jwt_algorithm(&self) -> Result<Algorithm, ConfigError> {
        match Algorithm::from_str(&self.algorithm) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
            _ => Err(ConfigError::Message(format!(
                "unsupported JWT algorithm '{}', expected HS256, HS384 or HS512",
                self.algorithm
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    /// Published host port; unset means `database.port`.
    pub host_port: Option<u16>,
}

impl ContainerConfig {
    pub fn published_port(&self, database: &DatabaseConfig) -> u16 {
        self.host_port.unwrap_or(database.port)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub container: ContainerConfig,
}

/// `APP_` prefix, `__` between nesting levels: `APP_SERVER__PORT` sets `server.port`.
fn environment() -> Environment {
    Environment::with_prefix("app")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let mode_file = format!("config/{run_mode}");

        let settings: Settings = Self::defaults(Config::builder(), "development")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&mode_file).required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        settings.auth.jwt_algorithm()?;
        Ok(settings)
    }

    /// Deterministic settings for tests; `APP_*` variables still apply.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::defaults(Config::builder(), "test")?
            .set_override("database.name", "birthday_greeter_test")?
            .set_override("database.max_connections", 2)?
            .set_override("auth.secret_key", "test_secret")?
            .set_override("auth.access_token_expire_minutes", 5)?
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    fn defaults(
        builder: ConfigBuilder<DefaultState>,
        mode: &str,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("environment", mode)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.name", "birthday_greeter")?
            .set_default("database.max_connections", 5)?
            .set_default("database.connect_attempts", 30)?
            .set_default("auth.secret_key", "development_secret")?
            .set_default("auth.algorithm", "HS256")?
            .set_default("auth.access_token_expire_minutes", 30)?
            .set_default("auth.signin_attempts_per_minute", 10)?
            .set_default("container.name", "birthday-greeter-db")?
            .set_default("container.image", "postgres:16")
    }

    /// `KEY=value` lines that reproduce these settings through the environment.
    pub fn to_env_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("APP_ENVIRONMENT={}", self.environment),
            format!("APP_SERVER__HOST={}", self.server.host),
            format!("APP_SERVER__PORT={}", self.server.port),
            format!("APP_SERVER__WORKERS={}", self.server.workers),
            format!("APP_DATABASE__HOST={}", self.database.host),
            format!("APP_DATABASE__PORT={}", self.database.port),
            format!("APP_DATABASE__USER={}", self.database.user),
            format!("APP_DATABASE__PASSWORD={}", self.database.password),
            format!("APP_DATABASE__NAME={}", self.database.name),
            format!(
                "APP_DATABASE__MAX_CONNECTIONS={}",
                self.database.max_connections
            ),
            format!(
                "APP_DATABASE__CONNECT_ATTEMPTS={}",
                self.database.connect_attempts
            ),
            format!("APP_AUTH__SECRET_KEY={}", self.auth.secret_key),
            format!("APP_AUTH__ALGORITHM={}", self.auth.algorithm),
            format!(
                "APP_AUTH__ACCESS_TOKEN_EXPIRE_MINUTES={}",
                self.auth.access_token_expire_minutes
            ),
            format!(
                "APP_AUTH__SIGNIN_ATTEMPTS_PER_MINUTE={}",
                self.auth.signin_attempts_per_minute
            ),
            format!("APP_CONTAINER__NAME={}", self.container.name),
            format!("APP_CONTAINER__IMAGE={}", self.container.image),
        ];
        if let Some(port) = self.container.host_port {
            lines.push(format!("APP_CONTAINER__HOST_PORT={port}"));
        }
        lines
    }
}
