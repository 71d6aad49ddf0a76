use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CHANGE_CHANNEL: &str = "candidates_changes";
pub const DEFAULT_REFRESH_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub change_channel: String,
    pub refresh_debounce_ms: u64,
    pub rest: Option<RestConfig>,
}

/// Hosted table endpoint. Only used when both the URL and the key are set.
///
/// Change notifications still arrive over `DATABASE_URL`, so in this mode it
/// must be the direct connection to the same hosted database.
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub url: String,
    pub api_key: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let rest = match (env::var("REST_URL").ok(), env::var("REST_API_KEY").ok()) {
            (Some(url), Some(api_key)) if !url.is_empty() && !api_key.is_empty() => {
                Some(RestConfig { url, api_key })
            }
            _ => None,
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            change_channel: env::var("CHANGE_CHANNEL")
                .unwrap_or_else(|_| DEFAULT_CHANGE_CHANNEL.to_string()),
            refresh_debounce_ms: get_env_parse_or(
                "REFRESH_DEBOUNCE_MS",
                DEFAULT_REFRESH_DEBOUNCE_MS,
            )?,
            rest,
        })
    }

    pub fn refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.refresh_debounce_ms)
    }

    /// The schema is only ours to migrate when we talk to Postgres directly.
    /// A hosted table is externally owned.
    pub fn runs_migrations(&self) -> bool {
        self.rest.is_none()
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
