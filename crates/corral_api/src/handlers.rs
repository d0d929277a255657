use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use crate::dto::{BannerResponse, HealthResponse, HistoryRecordDto, MovementStatsDto, TagStateDto};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Liveness banner at the service root.
pub async fn root(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "corral API is running",
        udp_port: state.udp_port,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Millisecond time window shared by the history and stats queries.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl RangeQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if self.start_ms > self.end_ms {
            return Err(ApiError::bad_request("start_ms must not exceed end_ms"));
        }
        Ok(())
    }
}

/// Current state of every known tag.
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<TagStateDto>>> {
    let tags = state.query.tags().await?;
    Ok(Json(tags.into_iter().map(TagStateDto::from).collect()))
}

/// Raw position history inside the requested window.
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<Vec<HistoryRecordDto>>> {
    range.validate()?;

    let rows = state.query.history(range.start_ms, range.end_ms).await?;
    Ok(Json(rows.into_iter().map(HistoryRecordDto::from).collect()))
}

/// Movement statistics per tag over the requested window.
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<BTreeMap<String, MovementStatsDto>>> {
    range.validate()?;

    let stats = state
        .query
        .movement_stats(range.start_ms, range.end_ms)
        .await?;
    Ok(Json(
        stats
            .into_iter()
            .map(|(uid, per_tag)| (uid, MovementStatsDto::from(per_tag)))
            .collect(),
    ))
}
