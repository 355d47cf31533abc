use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rankings_core::domain::ranking::RankingPeriod;
use rankings_core::domain::trending::TrendingAnalysisResult;
use rankings_core::ingest::normalize_all;
use rankings_core::trending::{
    analyze_trending_data, filter_trending_data_by_time_range, TimeRange,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";
const NO_DATA_WARNING: &str = "No historical ranking data available";

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingQuery {
    months: Option<String>,
}

#[derive(Debug, Serialize)]
struct TrendingResponse<'a> {
    #[serde(flatten)]
    result: &'a TrendingAnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

pub(crate) async fn get_trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Response {
    let started = Instant::now();
    let range = TimeRange::from_query(query.months.as_deref());

    if let Some(cached) = state.trending_cache.get(&range).await {
        tracing::info!(
            time_range = %range,
            processing_time_ms = started.elapsed().as_millis(),
            "trending analysis served from cache"
        );
        return trending_response(&cached, range, CacheStatus::Hit);
    }

    let periods = match load_periods(&state).await {
        Ok(periods) => periods,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::warn!(
                error = %e,
                processing_time_ms = started.elapsed().as_millis(),
                "returning empty trending data due to read error"
            );
            return no_data_response();
        }
    };

    if periods.is_empty() {
        tracing::warn!("no historical rankings found in store");
        return no_data_response();
    }

    let analysis = analyze_trending_data(&periods);
    let result =
        filter_trending_data_by_time_range(&analysis, range, chrono::Utc::now().date_naive());

    state.trending_cache.insert(range, result.clone()).await;

    let cached_ranges = state.trending_cache.len().await;
    tracing::info!(
        time_range = %range,
        periods_processed = periods.len(),
        tools_found = result.tools.len(),
        chart_data_points = result.chart_data.len(),
        cached_ranges = cached_ranges,
        cache_ttl_secs = state.trending_cache.ttl().as_secs(),
        processing_time_ms = started.elapsed().as_millis(),
        "trending analysis completed"
    );

    trending_response(&result, range, CacheStatus::Miss)
}

async fn load_periods(state: &AppState) -> anyhow::Result<Vec<RankingPeriod>> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("ranking store is not configured"))?;
    let stored = store.fetch_all().await?;
    Ok(normalize_all(stored))
}

fn trending_response(
    result: &TrendingAnalysisResult,
    range: TimeRange,
    cache_status: CacheStatus,
) -> Response {
    let body = match serde_json::to_vec(&TrendingResponse {
        result,
        warning: None,
    }) {
        Ok(body) => body,
        Err(e) => return internal_error(anyhow::Error::new(e)),
    };

    let etag = format!("\"trending-{}-{range}\"", result.metadata.total_periods);
    let etag = match HeaderValue::from_str(&etag) {
        Ok(v) => v,
        Err(e) => return internal_error(anyhow::Error::new(e)),
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
            (
                header::HeaderName::from_static("x-cache-status"),
                HeaderValue::from_static(cache_status.as_str()),
            ),
            (header::ETAG, etag),
        ],
        body,
    )
        .into_response()
}

fn no_data_response() -> Response {
    let empty = TrendingAnalysisResult::empty();
    Json(TrendingResponse {
        result: &empty,
        warning: Some(NO_DATA_WARNING),
    })
    .into_response()
}

fn internal_error(err: anyhow::Error) -> Response {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "failed to generate trending analysis");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Failed to analyze trending data",
            "details": format!("{err:#}"),
        })),
    )
        .into_response()
}
