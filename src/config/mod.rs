use std::env;

use crate::analytics::DEFAULT_ROLLING_WINDOW;

const DEV_JWT_SECRET: &str = "change-me-for-prod";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string. Unset → in-memory journal.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    // Auth
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,

    // Analytics
    pub rolling_window: usize,

    // Storage fallback
    pub reconnect_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set — using insecure development secret");
            DEV_JWT_SECRET.into()
        });

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".into())
                .parse()?,

            jwt_secret,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),

            rolling_window: env::var("ROLLING_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(DEFAULT_ROLLING_WINDOW),

            reconnect_interval_secs: env::var("RECONNECT_INTERVAL_SECS")
                .unwrap_or_else(|_| "15".into())
                .parse()
                .unwrap_or(15),
        })
    }
}
