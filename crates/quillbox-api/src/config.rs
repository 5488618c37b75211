//! Server configuration.
//!
//! Everything the server needs from the environment is read once, here, into
//! one explicit object that gets passed to the collaborators at startup.
//! Nothing else in the codebase touches environment variables.

use quillbox_core::{Error, Result};
use quillbox_media::MediaConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5050;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/quillbox";

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Listen host (`HOST`).
    pub host: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// CORS origin whitelist (`ALLOWED_ORIGINS`, comma-separated).
    pub allowed_origins: Vec<String>,
    /// Media provider credentials (`MEDIA_CLOUD_NAME` / `MEDIA_API_KEY` /
    /// `MEDIA_API_SECRET`). Required: the upload path cannot degrade
    /// gracefully without them.
    pub media: MediaConfig,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allowed_origins = parse_origins(
            &std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );

        let media = MediaConfig::new(
            require_env("MEDIA_CLOUD_NAME")?,
            require_env("MEDIA_API_KEY")?,
            require_env("MEDIA_API_SECRET")?,
        );

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            media,
        })
    }

    /// The socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list, dropping empty entries.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
}
