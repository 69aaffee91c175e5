//! HTTP request handlers for the reconciliation API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ReconResult;
use crate::io::write_report;
use crate::models::ReconReport;
use crate::reconciliation::run;

use super::request::UploadBundle;
use super::response::ApiErrorResponse;
use super::state::AppState;

/// Largest accepted request body, all five files together.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/reconcile", post(reconcile_handler))
        .route("/reconcile/preview", post(preview_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Handler for POST /reconcile.
///
/// Runs a reconciliation and returns the result workbook as a download.
async fn reconcile_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing reconciliation request");

    let file_name = state.config().report.output_file_name.clone();
    let result = reconcile_upload(&state, multipart, correlation_id, |report| {
        write_report(&report)
    })
    .await;

    match result {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Handler for POST /reconcile/preview.
///
/// Runs a reconciliation and returns the tables, summary and audit trace as JSON.
async fn preview_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing preview request");

    match reconcile_upload(&state, multipart, correlation_id, Ok).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Collects the upload, runs the pipeline off the async runtime and hands the
/// report to `finish` on the same blocking worker.
async fn reconcile_upload<T, F>(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    correlation_id: Uuid,
    finish: F,
) -> Result<T, ApiErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(ReconReport) -> ReconResult<T> + Send + 'static,
{
    let multipart = multipart.map_err(|rejection| {
        warn!(
            correlation_id = %correlation_id,
            error = %rejection.body_text(),
            "Rejected upload"
        );
        ApiErrorResponse::invalid_upload(rejection.body_text())
    })?;

    let bundle = UploadBundle::from_multipart(multipart).await?;
    if let Err(err) = bundle.ensure_complete() {
        warn!(
            correlation_id = %correlation_id,
            missing = ?err.error.details,
            "Upload incomplete"
        );
        return Err(err);
    }

    let config = state.shared_config();
    let start_time = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        let inputs = bundle.into_inputs(&config)?;
        let report = run(inputs, &config)?;
        let run_id = report.run_id;
        finish(report).map(|value| (run_id, value))
    })
    .await
    .map_err(|e| {
        warn!(
            correlation_id = %correlation_id,
            error = %e,
            "Reconciliation worker did not finish"
        );
        ApiErrorResponse::internal()
    })?;

    match outcome {
        Ok((run_id, value)) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %run_id,
                duration_us = start_time.elapsed().as_micros(),
                "Reconciliation request completed"
            );
            Ok(value)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Reconciliation failed"
            );
            Err(err.into())
        }
    }
}
