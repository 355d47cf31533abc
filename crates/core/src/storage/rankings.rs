use crate::ingest::types::StoredRanking;
use anyhow::Context;
use serde_json::Value;
use uuid::Uuid;

/// Read side of the ranking period store.
#[async_trait::async_trait]
pub trait RankingStore: Send + Sync {
    /// Every stored document, in no particular order.
    async fn fetch_all(&self) -> anyhow::Result<Vec<StoredRanking>>;

    async fn fetch_period(&self, period: &str) -> anyhow::Result<Option<StoredRanking>>;

    /// The row flagged current, falling back to the latest period.
    async fn fetch_current(&self) -> anyhow::Result<Option<StoredRanking>>;
}

#[derive(Debug, Clone)]
pub struct PgRankingStore {
    pool: sqlx::PgPool,
}

impl PgRankingStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type RankingRow = (String, String, Value);

fn into_stored((period, algorithm_version, data): RankingRow) -> StoredRanking {
    StoredRanking {
        period,
        algorithm_version: Some(algorithm_version),
        data,
    }
}

#[async_trait::async_trait]
impl RankingStore for PgRankingStore {
    async fn fetch_all(&self) -> anyhow::Result<Vec<StoredRanking>> {
        let rows = sqlx::query_as::<_, RankingRow>(
            "SELECT period, algorithm_version, data FROM rankings",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("select rankings failed")?;

        Ok(rows.into_iter().map(into_stored).collect())
    }

    async fn fetch_period(&self, period: &str) -> anyhow::Result<Option<StoredRanking>> {
        let row = sqlx::query_as::<_, RankingRow>(
            "SELECT period, algorithm_version, data FROM rankings WHERE period = $1 LIMIT 1",
        )
        .persistent(false)
        .bind(period)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select rankings for period={period} failed"))?;

        Ok(row.map(into_stored))
    }

    async fn fetch_current(&self) -> anyhow::Result<Option<StoredRanking>> {
        let row = sqlx::query_as::<_, RankingRow>(
            "SELECT period, algorithm_version, data \
             FROM rankings \
             ORDER BY is_current DESC, period DESC \
             LIMIT 1",
        )
        .persistent(false)
        .fetch_optional(&self.pool)
        .await
        .context("select current rankings failed")?;

        Ok(row.map(into_stored))
    }
}

/// Inserts or replaces one period's document. With `make_current`, the period becomes the only
/// row flagged current.
pub async fn upsert_period(
    pool: &sqlx::PgPool,
    period: &str,
    algorithm_version: &str,
    data: Value,
    make_current: bool,
) -> anyhow::Result<Uuid> {
    anyhow::ensure!(!period.trim().is_empty(), "period must be non-empty");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    if make_current {
        sqlx::query("UPDATE rankings SET is_current = FALSE, updated_at = now() WHERE is_current")
            .execute(&mut *tx)
            .await
            .context("clear current rankings failed")?;
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO rankings (id, period, algorithm_version, is_current, published_at, data) \
         VALUES ($1, $2, $3, $4, CASE WHEN $4 THEN now() ELSE NULL END, $5) \
         ON CONFLICT (period) DO UPDATE \
           SET algorithm_version = EXCLUDED.algorithm_version, \
               is_current = EXCLUDED.is_current OR rankings.is_current, \
               published_at = COALESCE(EXCLUDED.published_at, rankings.published_at), \
               data = EXCLUDED.data, \
               updated_at = now() \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(period)
    .bind(algorithm_version)
    .bind(make_current)
    .bind(data)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("upsert rankings for period={period} failed"))?;

    tx.commit().await.context("commit transaction failed")?;
    Ok(id)
}
