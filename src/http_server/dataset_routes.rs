//! Dataset HTTP Routes
//!
//! Upload, count, page, filter, export and schema endpoints. The owner
//! identifier travels in the path and names the dataset.
//!
//! Store work is synchronous file I/O and always runs on the blocking pool.

use std::io;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api::{
    ApiError, ApiResult, CountResponse, DatasetService, ErrorKind, ErrorResponse,
    IngestSummary, PageResponse,
};
use crate::planner::FilterMap;
use crate::schema::DatasetSchema;

/// Multipart field carrying the upload
const UPLOAD_FIELD: &str = "file";

/// Chunks buffered between the export worker and the response body
const EXPORT_CHANNEL_DEPTH: usize = 4;

// ==================
// Shared State
// ==================

/// Dataset state shared across handlers
pub struct DatasetState {
    pub service: DatasetService,
}

impl DatasetState {
    pub fn new(service: DatasetService) -> Self {
        Self { service }
    }
}

// ==================
// Request Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub filters: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl FilterQuery {
    fn filter_map(&self) -> ApiResult<FilterMap> {
        Ok(FilterMap::from_json(self.filters.as_deref().unwrap_or(""))?)
    }
}

/// Parses the `page` parameter; absent means page 1.
fn parse_page(raw: Option<&str>) -> ApiResult<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(s) => s.parse::<i64>().map_err(|_| {
            ApiError::new(
                ErrorKind::InvalidPage,
                format!("Page must be a positive integer, got '{}'", s),
            )
        }),
    }
}

// ==================
// Error Mapping
// ==================

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: ApiError) -> HandlerError {
    if err.kind().is_client_error() {
        debug!(code = err.code(), error = %err.message(), "request rejected");
    } else {
        error!(code = err.code(), error = %err.message(), "request failed");
    }
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from_error(&err)))
}

/// Owner from the path; a malformed segment is an invalid dataset name.
fn owner_from(path: Result<Path<String>, PathRejection>) -> Result<String, HandlerError> {
    path.map(|Path(owner)| owner).map_err(|rejection| {
        error_response(ApiError::new(
            ErrorKind::InvalidDatasetName,
            rejection.body_text(),
        ))
    })
}

/// Query parameters; rejections become `kind` errors with a JSON body.
fn query_from<T>(
    query: Result<Query<T>, QueryRejection>,
    kind: ErrorKind,
) -> Result<T, HandlerError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| error_response(ApiError::new(kind, rejection.body_text())))
}

async fn run_blocking<T, F>(task: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(error_response),
        Err(e) => Err(error_response(ApiError::storage_failure(format!(
            "Worker task failed: {}",
            e
        )))),
    }
}

// ==================
// Router
// ==================

/// Create dataset routes
pub fn dataset_routes(state: Arc<DatasetState>) -> Router {
    Router::new()
        .route("/upload-csv/:owner", post(upload_handler))
        .route("/total-records/:owner", get(total_records_handler))
        .route("/table-data/:owner", get(table_data_handler))
        .route("/filtered-data/:owner", get(filtered_data_handler))
        .route("/total-filter-records/:owner", get(total_filter_records_handler))
        .route("/download-filtered-file/:owner", get(download_handler))
        .route("/schema/:owner", get(schema_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

/// Replace the owner's dataset with the uploaded file
async fn upload_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestSummary>, HandlerError> {
    let owner = owner_from(owner)?;
    let mut multipart = multipart
        .map_err(|rejection| error_response(ApiError::invalid_format(rejection.body_text())))?;
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(ApiError::invalid_format(e.to_string())))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| error_response(ApiError::invalid_format(e.to_string())))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| error_response(ApiError::invalid_format("No file part")))?;
    if file_name.is_empty() {
        return Err(error_response(ApiError::invalid_format("No selected file")));
    }

    let service = state.service.clone();
    let summary = run_blocking(move || service.ingest(&owner, &file_name, &data)).await?;
    Ok(Json(summary))
}

/// Total rows of the owner's dataset
async fn total_records_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
) -> Result<Json<CountResponse>, HandlerError> {
    let owner = owner_from(owner)?;
    let service = state.service.clone();
    let count = run_blocking(move || service.total_count(&owner)).await?;
    Ok(Json(count))
}

/// One unfiltered page
async fn table_data_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PageResponse>, HandlerError> {
    let owner = owner_from(owner)?;
    let query = query_from(query, ErrorKind::InvalidPage)?;
    let page = parse_page(query.page.as_deref()).map_err(error_response)?;
    let service = state.service.clone();
    let result = run_blocking(move || service.page(&owner, page)).await?;
    Ok(Json(result))
}

/// One filtered page
async fn filtered_data_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<PageResponse>, HandlerError> {
    let owner = owner_from(owner)?;
    let query = query_from(query, ErrorKind::InvalidFilter)?;
    let filter = query.filter_map().map_err(error_response)?;
    let page = parse_page(query.page.as_deref()).map_err(error_response)?;
    let service = state.service.clone();
    let result = run_blocking(move || service.filtered_page(&owner, &filter, page)).await?;
    Ok(Json(result))
}

/// Filtered row count
async fn total_filter_records_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<CountResponse>, HandlerError> {
    let owner = owner_from(owner)?;
    let query = query_from(query, ErrorKind::InvalidFilter)?;
    let filter = query.filter_map().map_err(error_response)?;
    let service = state.service.clone();
    let count = run_blocking(move || service.filtered_count(&owner, &filter)).await?;
    Ok(Json(count))
}

/// Stream every matching row as a delimited attachment
async fn download_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Response, HandlerError> {
    let owner = owner_from(owner)?;
    let query = query_from(query, ErrorKind::InvalidFilter)?;
    let filter = query.filter_map().map_err(error_response)?;
    let service = state.service.clone();
    let stream = run_blocking(move || service.export_filtered(&owner, &filter)).await?;

    let content_type = stream.format().content_type();
    let disposition = format!("attachment; filename=\"{}\"", stream.file_name());

    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(EXPORT_CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || {
        for chunk in stream {
            let item = chunk
                .map(Bytes::from)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()));
            let failed = item.is_err();
            if tx.blocking_send(item).is_err() {
                warn!("export receiver dropped before completion");
                break;
            }
            if failed {
                break;
            }
        }
    });

    let body = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(body))
        .map_err(|e| error_response(ApiError::storage_failure(e.to_string())))
}

/// Schema of the owner's dataset
async fn schema_handler(
    State(state): State<Arc<DatasetState>>,
    owner: Result<Path<String>, PathRejection>,
) -> Result<Json<DatasetSchema>, HandlerError> {
    let owner = owner_from(owner)?;
    let service = state.service.clone();
    let schema = run_blocking(move || service.schema(&owner)).await?;
    Ok(Json(schema))
}
