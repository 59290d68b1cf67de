//! Render handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use tracing::info;

use capburn_models::RenderRequest;
use capburn_pipeline::{header_credential, SECRET_HEADER};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Successful render response.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub status: &'static str,
    pub job_id: String,
    pub video_url: String,
}

/// `POST /render`: run one caption burn-in job and return the artifact URL.
///
/// An unparseable body carries no usable inline credential, so it is only
/// reported as malformed when the header credential checks out.
pub async fn render(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<RenderResponse>> {
    let header_secret = header_credential(
        headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()),
        headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
    );

    let request: RenderRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            state.pipeline.authorize(header_secret, None)?;
            return Err(ApiError::bad_request(format!("malformed JSON body: {}", e)));
        }
    };

    let report = state.pipeline.handle(request, header_secret).await?;
    info!(
        job_id = %report.job_id,
        key = %report.artifact_key,
        watermark = %report.watermark_mode,
        events = report.subtitle_events,
        "Render published"
    );

    Ok(Json(RenderResponse {
        status: "success",
        job_id: report.job_id,
        video_url: report.video_url,
    }))
}
