use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:ideas.db?mode=rwc";
pub const DEFAULT_DATABASE_NAME: &str = "ideas";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

/// Connection settings for the document store. Both values are optional:
/// diagnostics report whether they were provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|e| {
                AppError::ConfigurationError(format!("Invalid PORT value {:?}: {}", raw, e))
            })?,
            Err(_) => 8000,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: non_empty_var("DATABASE_URL"),
                name: non_empty_var("DATABASE_NAME"),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    pub fn url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_DATABASE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
