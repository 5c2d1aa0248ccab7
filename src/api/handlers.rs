use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::engine::UploadSummary;
use crate::models::{CourseSummary, EvaluatedRecord, PerformanceIndicators};
use crate::state::AppState;
use crate::table::{self, RawTable};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: UploadSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub snapshot_version: u64,
    pub records: usize,
    pub topic_courses: usize,
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart data"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Invalid multipart data"))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    let allowed = table::extension(&filename)
        .is_some_and(|ext| state.settings().is_allowed_extension(&ext));
    if !allowed {
        return Err(ApiError::bad_request("Invalid file format"));
    }

    if let Err(err) = state.uploads().save(&filename, &bytes).await {
        tracing::warn!(filename = %filename, error = %err, "failed to retain upload");
    }

    let engine = Arc::clone(state.engine());
    let source = filename.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let table = RawTable::from_bytes(&bytes, &source).inspect_err(|err| {
            tracing::warn!(filename = %source, error = %err, "failed to read upload");
        })?;
        engine.process_upload(&table, Some(source.as_str()))
    })
    .await
    .map_err(|err| ApiError::internal(err, "Upload processing failed"))??;

    tracing::info!(filename = %filename, version = summary.version, "upload accepted");
    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully.".to_string(),
        summary,
    }))
}

pub async fn grades(State(state): State<AppState>) -> Json<Vec<EvaluatedRecord>> {
    Json(state.engine().snapshot().records.clone())
}

pub async fn course_of_action(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.engine().recommendation_messages())
}

pub async fn performance_indicators(
    State(state): State<AppState>,
) -> Result<Json<PerformanceIndicators>, ApiError> {
    Ok(Json(state.engine().performance_indicators()?))
}

pub async fn course_summaries(State(state): State<AppState>) -> Json<Vec<CourseSummary>> {
    Json(state.engine().course_summaries())
}

pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.engine().snapshot();
    Json(HealthResponse {
        service: "grade-advisor",
        status: "healthy",
        snapshot_version: snapshot.version,
        records: snapshot.records.len(),
        topic_courses: state.engine().topics().len(),
    })
}
