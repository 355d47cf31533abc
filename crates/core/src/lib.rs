pub mod cache;
pub mod domain;
pub mod ingest;
pub mod storage;
pub mod time;
pub mod trending;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_TRENDING_CACHE_TTL_SECS: u64 = 3600;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub trending_cache_ttl: Duration,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let ttl_secs = match std::env::var("TRENDING_CACHE_TTL_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("TRENDING_CACHE_TTL_SECS is not a number: {s}"))?,
                Err(_) => DEFAULT_TRENDING_CACHE_TTL_SECS,
            };

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                trending_cache_ttl: Duration::from_secs(ttl_secs),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }
}
