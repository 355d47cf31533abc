use crate::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use rankings_core::cache::TtlCache;
use rankings_core::ingest::types::StoredRanking;
use rankings_core::storage::rankings::RankingStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub struct MemoryStore {
    docs: Vec<StoredRanking>,
    fail: bool,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new(docs: Vec<StoredRanking>) -> Self {
        Self {
            docs,
            fail: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(!self.fail, "connection refused");
        Ok(())
    }
}

#[async_trait::async_trait]
impl RankingStore for MemoryStore {
    async fn fetch_all(&self) -> anyhow::Result<Vec<StoredRanking>> {
        self.check()?;
        Ok(self.docs.clone())
    }

    async fn fetch_period(&self, period: &str) -> anyhow::Result<Option<StoredRanking>> {
        self.check()?;
        Ok(self.docs.iter().find(|d| d.period == period).cloned())
    }

    async fn fetch_current(&self) -> anyhow::Result<Option<StoredRanking>> {
        self.check()?;
        Ok(self.docs.iter().max_by(|a, b| a.period.cmp(&b.period)).cloned())
    }
}

pub fn test_state(store: Option<Arc<MemoryStore>>) -> AppState {
    AppState {
        store: store.map(|s| s as Arc<dyn RankingStore>),
        trending_cache: Arc::new(TtlCache::new(
            Duration::from_secs(3600),
            crate::TRENDING_CACHE_MAX_ENTRIES,
        )),
    }
}

pub async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(res: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
