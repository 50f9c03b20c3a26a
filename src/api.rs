use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::export::Template;
use crate::models::SourceDocument;
use crate::services::batch_service::{BatchError, BatchOutcome};
use crate::services::BatchService;
use crate::session::UploadSession;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Response header carrying the number of batch diagnostics behind a download
pub const DIAGNOSTIC_COUNT_HEADER: &str = "x-diagnostic-count";

#[derive(Clone)]
pub struct AppState {
    pub batch_service: BatchService,
    pub default_file_name: String,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    #[serde(default = "default_template")]
    pub template: Template,
    pub file_name: Option<String>,
}

fn default_template() -> Template {
    Template::Aggregate
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/reports/records", post(extract_records))
        .route("/reports/export", post(export_report))
        .layer(body_limit)
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[instrument]
async fn health() -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Extract records from the uploaded reports and return them as JSON
#[instrument(skip(state, multipart))]
async fn extract_records(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchOutcome>, ApiError> {
    let documents = read_documents(multipart).await?;
    let service = state.batch_service.clone();

    let outcome = tokio::task::spawn_blocking(move || service.extract_batch(&documents))
        .await
        .map_err(|e| {
            error!("Extraction task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details("Extraction failed", e.to_string())),
            )
        })?;

    info!(
        "Returning {} records with {} diagnostics",
        outcome.records.len(),
        outcome.diagnostics.len()
    );
    Ok(Json(outcome))
}

/// Extract the uploaded reports and return one template as an xlsx download
#[instrument(skip(state, multipart), fields(template = %params.template))]
async fn export_report(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let documents = read_documents(multipart).await?;

    let mut session = UploadSession::new(&state.default_file_name).with_documents(documents);
    if let Some(name) = &params.file_name {
        session = session.with_file_name(name);
    }

    let template = params.template;
    let service = state.batch_service.clone();
    let (session, result) = tokio::task::spawn_blocking(move || {
        let result = service.export_batch(session.documents(), &[template]);
        (session, result)
    })
    .await
    .map_err(|e| {
        error!("Export task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details("Export failed", e.to_string())),
        )
    })?;

    let export = result.map_err(batch_error_response)?;
    let workbook = export.workbook(template).ok_or_else(|| {
        error!("{} workbook missing from export", template);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Workbook was not produced")),
        )
    })?;

    let file_name = match template {
        Template::Aggregate => session.aggregate_file_name(),
        Template::Detail => session.detail_file_name().to_string(),
    };
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| {
            warn!("Unusable download name '{}': {}", file_name, e);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Invalid file name", e.to_string())),
            )
        })?;

    info!(
        "Sending '{}' ({} bytes, {} records, {} diagnostics)",
        file_name,
        workbook.bytes.len(),
        export.records.len(),
        export.diagnostics.len()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static(DIAGNOSTIC_COUNT_HEADER),
                HeaderValue::from(export.diagnostics.len()),
            ),
        ],
        workbook.bytes.clone(),
    )
        .into_response())
}

fn batch_error_response(e: BatchError) -> ApiError {
    match e {
        BatchError::NothingToExport => {
            warn!("{}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e.to_string())),
            )
        }
        BatchError::Export(_) | BatchError::Rules(_) => {
            error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details("Export failed", e.to_string())),
            )
        }
    }
}

/// Collect uploaded files in the order the client sent them
async fn read_documents(mut multipart: Multipart) -> Result<Vec<SourceDocument>, ApiError> {
    let mut documents = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Failed to read upload", e.to_string())),
        )
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" && field_name != "files" {
            debug!("Ignoring multipart field '{}'", field_name);
            continue;
        }

        let name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("document-{}.pdf", documents.len() + 1));

        let bytes = field.bytes().await.map_err(|e| {
            error!("Failed to read file data for '{}': {}", name, e);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details("Failed to read file data", e.to_string())),
            )
        })?;

        debug!("Received '{}' ({} bytes)", name, bytes.len());
        documents.push(SourceDocument::new(name, bytes.to_vec()));
    }

    info!("Received {} documents", documents.len());
    Ok(documents)
}
