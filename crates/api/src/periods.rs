use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rankings_core::domain::ranking::RankingPeriod;
use rankings_core::ingest::normalize_stored_ranking;
use rankings_core::ingest::types::StoredRanking;
use rankings_core::time::period::parse_period_date;

pub(crate) async fn get_current_period(
    State(state): State<AppState>,
) -> Result<Json<RankingPeriod>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let stored = store.fetch_current().await.map_err(store_error)?;
    into_period(stored)
}

pub(crate) async fn get_period(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Json<RankingPeriod>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    if parse_period_date(&period).is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let stored = store.fetch_period(&period).await.map_err(store_error)?;
    into_period(stored)
}

fn store_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "ranking store query failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn into_period(stored: Option<StoredRanking>) -> Result<Json<RankingPeriod>, StatusCode> {
    stored
        .and_then(normalize_stored_ranking)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
