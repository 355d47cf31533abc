use crate::time::period::parse_period_date;
use anyhow::Context;
use chrono::Datelike;

// Advisory locks are scoped to the Postgres session, so acquire and release must run on the same
// connection. This is a best-effort guard against two imports writing the same period at once.
const LOCK_NAMESPACE: i64 = 0x5241_4E4B_494E; // "RANKIN" as hex-ish namespace.

fn lock_key_for_period(period: &str) -> anyhow::Result<i64> {
    let date = parse_period_date(period)
        .with_context(|| format!("period is not a date, cannot lock: {period}"))?;
    Ok(LOCK_NAMESPACE ^ (date.num_days_from_ce() as i64))
}

pub async fn try_acquire_period_lock(
    conn: &mut sqlx::PgConnection,
    period: &str,
) -> anyhow::Result<bool> {
    let key = lock_key_for_period(period)?;
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;
    Ok(acquired.0)
}

/// Returns `false` when this session did not hold the lock.
pub async fn release_period_lock(
    conn: &mut sqlx::PgConnection,
    period: &str,
) -> anyhow::Result<bool> {
    let key = lock_key_for_period(period)?;
    let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(conn)
        .await
        .with_context(|| format!("failed to release advisory lock (key={key})"))?;
    Ok(released.0)
}
