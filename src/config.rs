use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    /// Unset means the in-memory store is used.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("ROLLBOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("ROLLBOOK_BIND is not a socket address: `{}`", bind))?;

        let max_connections = match lookup("ROLLBOOK_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("ROLLBOOK_MAX_CONNECTIONS is not a number: `{}`", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            bind,
            database_url,
            max_connections,
        })
    }
}
