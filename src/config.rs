use std::env;

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub store_utc_offset_hours: i32,
    pub cors_allow_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let store_utc_offset_hours = env::var("STORE_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|h| h.parse::<i32>().ok())
            .filter(|h| (-23..=23).contains(h))
            .unwrap_or(7);
        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            session_secret,
            session_ttl_hours,
            cookie_secure,
            store_utc_offset_hours,
            cors_allow_origin,
        })
    }

    /// Settings for tests and tools that never bind a socket.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            session_secret: "test-session-secret".to_string(),
            session_ttl_hours: 24,
            cookie_secure: false,
            store_utc_offset_hours: 7,
            cors_allow_origin: "*".to_string(),
        }
    }

    /// Wall-clock time in the store's local calendar. Promo windows are
    /// expressed in calendar days, so they are compared against this.
    pub fn store_now(&self) -> NaiveDateTime {
        let offset = FixedOffset::east_opt(self.store_utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        Utc::now().with_timezone(&offset).naive_local()
    }
}
