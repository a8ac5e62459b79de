use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use cowfuel_sheets::{render_report, ReportKind};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Serves one CSV report drawn from the current snapshot as an attachment.
pub(super) async fn download_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let kind: ReportKind = kind
        .parse()
        .map_err(|message: String| ApiError::new(req_id.0.clone(), "not_found", message))?;

    let view = state.cache.snapshot().await;
    let body = render_report(kind, &view.snapshot).map_err(|e| {
        tracing::error!(error = %e, report = %kind, "failed to render report");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to render report")
    })?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", kind.file_name()),
        ),
    ];
    Ok((headers, body).into_response())
}
