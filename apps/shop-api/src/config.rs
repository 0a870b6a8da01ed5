//! Configuration for the Shop API

use core_config::database::DatabaseConfig;
use core_config::server::ServerConfig;
use core_config::{ConfigError, Environment, FromEnv};

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}
