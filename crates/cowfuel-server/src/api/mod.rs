mod fuel;
mod reports;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use cowfuel_sheets::{SheetClient, SnapshotCache, SnapshotView};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

pub type FuelCache = SnapshotCache<SheetClient>;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<FuelCache>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

/// Envelope metadata. The freshness fields describe the snapshot the
/// response was built from.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub fetched_at: Option<DateTime<FixedOffset>>,
    pub stale: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct PingData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            fetched_at: None,
            stale: false,
            last_error: None,
        }
    }

    pub(super) fn for_view(request_id: String, view: &SnapshotView) -> Self {
        Self {
            fetched_at: view.fetched_at,
            stale: view.stale,
            last_error: view.last_error.clone(),
            ..Self::new(request_id)
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn from_view(req_id: RequestId, view: &SnapshotView, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::for_view(req_id.0, view),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn fuel_router() -> Router<AppState> {
    Router::new()
        .route("/api/fuel/sites", get(fuel::list_sites))
        .route("/api/fuel/central", get(fuel::list_central))
        .route("/api/fuel/today", get(fuel::list_due_today))
        .route("/api/fuel/tomorrow", get(fuel::list_due_tomorrow))
        .route("/api/fuel/after-tomorrow", get(fuel::list_due_after_tomorrow))
        .route("/api/fuel/stats", get(fuel::get_stats))
        .route("/api/fuel/overview", get(fuel::get_overview))
        .route("/api/fuel/reports/{kind}", get(reports::download_report))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .merge(fuel_router())
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

/// Liveness probe. Reports cache freshness without triggering a fetch.
async fn ping(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let view = state.cache.peek().await;
    ApiResponse::from_view(req_id, &view, PingData { status: "ok" })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
