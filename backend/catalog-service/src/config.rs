//! Configuration management for Catalog Service
//!
//! Loads settings from environment variables, with a `.env` file picked up
//! in debug builds.
//!
//! # Example
//!
//! ```no_run
//! use catalog_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("listening on {}", settings.server.address());
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "catalog-dev-secret";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub images: ImageSettings,
    pub jwt: JwtSettings,
    /// Seed admin1/secret and user1/secret at startup
    pub seed_demo_users: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            images: ImageSettings::from_env(),
            jwt: JwtSettings::from_env()?,
            seed_demo_users: env::var("SEED_DEMO_USERS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("Invalid SEED_DEMO_USERS")?,
        })
    }
}

/// gRPC listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where uploaded images are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSettings {
    pub folder: PathBuf,
}

impl ImageSettings {
    fn from_env() -> Self {
        Self {
            folder: env::var("IMAGE_FOLDER")
                .unwrap_or_else(|_| "./img".to_string())
                .into(),
        }
    }
}

/// Token signing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    #[serde(skip_serializing)]
    pub secret: String,
    pub token_duration_secs: u64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            _ => bail!("JWT_SECRET must be set"),
        };

        Ok(Self {
            secret,
            token_duration_secs: env::var("JWT_TOKEN_DURATION_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid JWT_TOKEN_DURATION_SECS")?,
        })
    }

    pub fn token_duration(&self) -> Duration {
        Duration::from_secs(self.token_duration_secs)
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("token_duration_secs", &self.token_duration_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_settings_debug_redacts_secret() {
        let settings = JwtSettings {
            secret: "super-secret".to_string(),
            token_duration_secs: 900,
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert_eq!(settings.token_duration(), Duration::from_secs(900));
    }

    #[test]
    fn test_server_address() {
        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 50051,
        };
        assert_eq!(server.address(), "127.0.0.1:50051");
    }
}
