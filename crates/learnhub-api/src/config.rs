//! Runtime configuration from environment variables. `DATABASE_URL` is the
//! only required setting; everything else has a development default.

use anyhow::Context;

const DEFAULT_PORT: u16 = 5000;
const DEV_JWT_SECRET: &str = "learnhub-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Env: `DATABASE_URL`. Required.
    pub database_url: String,

    /// HTTP listen port. Env: `PORT`. Default: `5000`.
    pub port: u16,

    /// HMAC secret for signing tokens. Env: `JWT_SECRET`.
    /// Default: a development-only value (a warning is logged).
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match std::env::var("PORT") {
            Ok(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(value = %raw, "invalid PORT, using default");
                    DEFAULT_PORT
                }
            },
            Err(_) => DEFAULT_PORT,
        };

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using insecure development default");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Config {
            database_url,
            port,
            jwt_secret,
        })
    }
}
