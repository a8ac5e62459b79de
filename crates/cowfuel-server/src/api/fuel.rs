use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use cowfuel_sheets::{ProcessedSnapshot, SiteRecord, SnapshotCounts};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

type SitesResponse = Json<ApiResponse<Vec<SiteRecord>>>;

#[derive(Debug, Serialize)]
pub(super) struct FuelStats {
    pub reference_date: NaiveDate,
    #[serde(flatten)]
    pub counts: SnapshotCounts,
}

pub(super) async fn list_sites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> SitesResponse {
    let view = state.cache.snapshot().await;
    let data = view.snapshot.all_sites.clone();
    ApiResponse::from_view(req_id, &view, data)
}

pub(super) async fn list_central(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> SitesResponse {
    let view = state.cache.snapshot().await;
    let data = view.snapshot.central_sites.clone();
    ApiResponse::from_view(req_id, &view, data)
}

/// Overdue and today together.
pub(super) async fn list_due_today(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> SitesResponse {
    let view = state.cache.snapshot().await;
    let data = view.snapshot.due_today.clone();
    ApiResponse::from_view(req_id, &view, data)
}

pub(super) async fn list_due_tomorrow(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> SitesResponse {
    let view = state.cache.snapshot().await;
    let data = view.snapshot.due_tomorrow.clone();
    ApiResponse::from_view(req_id, &view, data)
}

pub(super) async fn list_due_after_tomorrow(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> SitesResponse {
    let view = state.cache.snapshot().await;
    let data = view.snapshot.due_after_tomorrow.clone();
    ApiResponse::from_view(req_id, &view, data)
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<FuelStats>> {
    let view = state.cache.snapshot().await;
    let data = FuelStats {
        reference_date: view.snapshot.reference_date,
        counts: view.snapshot.counts,
    };
    ApiResponse::from_view(req_id, &view, data)
}

pub(super) async fn get_overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ProcessedSnapshot>> {
    let view = state.cache.snapshot().await;
    let data = ProcessedSnapshot::clone(&view.snapshot);
    ApiResponse::from_view(req_id, &view, data)
}
