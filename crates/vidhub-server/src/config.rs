use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use tracing::warn;

use vidhub_core::token::TokenConfig;

const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub tokens: TokenConfig,
    pub secure_cookies: bool,
    pub media_dir: PathBuf,
    pub media_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to development defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let access_secret = lookup("VIDHUB_ACCESS_SECRET").unwrap_or_else(|| {
            warn!("VIDHUB_ACCESS_SECRET not set, using development secret");
            DEV_ACCESS_SECRET.to_string()
        });
        let refresh_secret = lookup("VIDHUB_REFRESH_SECRET").unwrap_or_else(|| {
            warn!("VIDHUB_REFRESH_SECRET not set, using development secret");
            DEV_REFRESH_SECRET.to_string()
        });

        let port: u16 = get("VIDHUB_PORT", "3000")
            .parse()
            .context("VIDHUB_PORT must be a port number")?;
        let access_ttl = ttl_seconds(&get("VIDHUB_ACCESS_TTL_SECS", "900"))
            .context("VIDHUB_ACCESS_TTL_SECS must be a positive number of seconds")?;
        let refresh_ttl = ttl_seconds(&get("VIDHUB_REFRESH_TTL_SECS", "864000"))
            .context("VIDHUB_REFRESH_TTL_SECS must be a positive number of seconds")?;
        let secure_cookies: bool = get("VIDHUB_SECURE_COOKIES", "true")
            .parse()
            .context("VIDHUB_SECURE_COOKIES must be true or false")?;

        Ok(Self {
            host: get("VIDHUB_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(get("VIDHUB_DB_PATH", "vidhub.db")),
            tokens: TokenConfig {
                access_secret,
                refresh_secret,
                access_ttl: Duration::seconds(access_ttl),
                refresh_ttl: Duration::seconds(refresh_ttl),
            },
            secure_cookies,
            media_dir: PathBuf::from(get("VIDHUB_MEDIA_DIR", "./uploads")),
            media_base_url: get("VIDHUB_MEDIA_BASE_URL", "/media"),
        })
    }
}

fn ttl_seconds(raw: &str) -> Result<i64> {
    let secs: i64 = raw.trim().parse()?;
    if secs <= 0 {
        bail!("{} is not a positive lifetime", secs);
    }
    Ok(secs)
}
