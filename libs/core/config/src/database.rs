use crate::{env_required, ConfigError, FromEnv};

/// PostgreSQL configuration
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl FromEnv for DatabaseConfig {
    /// Requires `DATABASE_URL` to be set (no default)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_from_env() {
        temp_env::with_var("DATABASE_URL", Some("postgres://localhost/shop"), || {
            let config = DatabaseConfig::from_env().unwrap();
            assert_eq!(config.url, "postgres://localhost/shop");
        });
    }

    #[test]
    fn test_database_config_missing_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = DatabaseConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }
}
