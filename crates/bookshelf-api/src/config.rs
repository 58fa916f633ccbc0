use anyhow::Context;

const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Env: `DATABASE_URL`. Required.
    pub database_url: String,

    /// HTTP listen port. Env: `PORT`. Default: `3001`.
    pub port: u16,
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

        Ok(Config { database_url, port })
    }
}
