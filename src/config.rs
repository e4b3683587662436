use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_PAGE_SIZE: &str = "6";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub listen_addr: SocketAddr,
    pub page_size: u32,
    pub ingredients_fixture: Option<PathBuf>,
    pub tags_fixture: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let page_size: u32 = try_load("PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(anyhow!("PAGE_SIZE must be at least 1"));
        }
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            listen_addr: try_load("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?,
            page_size,
            ingredients_fixture: optional("INGREDIENTS_FIXTURE").map(PathBuf::from),
            tags_fixture: optional("TAGS_FIXTURE").map(PathBuf::from),
        })
    }

    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            page_size: 6,
            ingredients_fixture: None,
            tags_fixture: None,
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(value) => {
            debug!("{key} loaded from environment");
            value
        }
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}
