//! HTTP Handlers for the BigQuery v2 REST API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use engine::protocol::{
    CreateDatasetRequest, CreateJobRequest, CreateTableRequest, DatasetList, DatasetResource,
    GetQueryResultsResponse, InsertAllRequest, InsertAllResponse, JobResource, TableList,
    TableResource,
};
use engine::Error;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Reject a body reference that names a different resource than the path
fn check_reference(kind: &str, body: Option<&str>, path: &str) -> Result<(), ApiError> {
    match body {
        Some(body) if body != path => Err(ApiError(Error::Validation(format!(
            "{kind} ID {body} in the request body does not match {path} in the path"
        )))),
        _ => Ok(()),
    }
}

fn check_not_empty(kind: &str, id: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError(Error::Validation(format!("{kind} ID must not be empty"))));
    }
    Ok(())
}

/// Discovery document handler
///
/// GET /discovery/v1/apis/bigquery/v2/rest
pub async fn discovery_document(State(state): State<Arc<AppState>>) -> Response {
    match &state.discovery {
        Some(document) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            document.clone(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            "No discovery document configured (start with --discovery-json-path)",
        )
            .into_response(),
    }
}

/// Health check handler
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Dataset list handler
///
/// GET /projects/{projectId}/datasets
pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Json<DatasetList> {
    tracing::info!("Listing datasets of {}", project_id);

    let datasets = state.warehouse.list_datasets(&project_id);
    Json(DatasetList::new(&datasets))
}

/// Dataset creation handler
///
/// POST /projects/{projectId}/datasets
pub async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Json(request): Json<CreateDatasetRequest>,
) -> ApiResult<DatasetResource> {
    let reference = &request.dataset_reference;
    check_reference("Project", reference.project_id.as_deref(), &project_id)?;
    check_not_empty("Dataset", &reference.dataset_id)?;

    let info = state
        .warehouse
        .create_dataset(&project_id, &reference.dataset_id)?;
    Ok(Json(DatasetResource::from_info(&info)))
}

/// Dataset lookup handler
///
/// GET /projects/{projectId}/datasets/{datasetId}
pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path((project_id, dataset_id)): Path<(String, String)>,
) -> ApiResult<DatasetResource> {
    let info = state.warehouse.get_dataset(&project_id, &dataset_id)?;
    Ok(Json(DatasetResource::from_info(&info)))
}

/// Table list handler
///
/// GET /projects/{projectId}/datasets/{datasetId}/tables
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
    Path((project_id, dataset_id)): Path<(String, String)>,
) -> ApiResult<TableList> {
    tracing::info!("Listing tables of {}:{}", project_id, dataset_id);

    let tables = state.warehouse.list_tables(&project_id, &dataset_id)?;
    Ok(Json(TableList::new(&tables)))
}

/// Table creation handler
///
/// POST /projects/{projectId}/datasets/{datasetId}/tables
pub async fn create_table(
    State(state): State<Arc<AppState>>,
    Path((project_id, dataset_id)): Path<(String, String)>,
    Json(request): Json<CreateTableRequest>,
) -> ApiResult<TableResource> {
    let reference = &request.table_reference;
    check_reference("Project", reference.project_id.as_deref(), &project_id)?;
    check_reference("Dataset", reference.dataset_id.as_deref(), &dataset_id)?;
    check_not_empty("Table", &reference.table_id)?;

    let info = state.warehouse.create_table(
        &project_id,
        &dataset_id,
        &reference.table_id,
        request.schema.fields,
    )?;
    Ok(Json(TableResource::from_info(&info)))
}

/// Table lookup handler
///
/// GET /projects/{projectId}/datasets/{datasetId}/tables/{tableId}
pub async fn get_table(
    State(state): State<Arc<AppState>>,
    Path((project_id, dataset_id, table_id)): Path<(String, String, String)>,
) -> ApiResult<TableResource> {
    let info = state
        .warehouse
        .get_table(&project_id, &dataset_id, &table_id)?;
    Ok(Json(TableResource::from_info(&info)))
}

/// Streaming insert handler
///
/// POST /projects/{projectId}/datasets/{datasetId}/tables/{tableId}/insertAll
pub async fn insert_all(
    State(state): State<Arc<AppState>>,
    Path((project_id, dataset_id, table_id)): Path<(String, String, String)>,
    Json(request): Json<InsertAllRequest>,
) -> ApiResult<InsertAllResponse> {
    let rows: Vec<_> = request.rows.into_iter().map(|row| row.json).collect();
    state
        .warehouse
        .insert_rows(&project_id, &dataset_id, &table_id, &rows)?;

    Ok(Json(InsertAllResponse::default()))
}

/// Job creation handler
///
/// POST /projects/{projectId}/jobs
///
/// The query runs to completion before the response is sent.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<JobResource> {
    let reference = &request.job_reference;
    check_reference("Project", reference.project_id.as_deref(), &project_id)?;

    let job_id = reference
        .job_id
        .clone()
        .unwrap_or_else(|| format!("job_{}", Uuid::new_v4().simple()));
    check_not_empty("Job", &job_id)?;

    tracing::info!(
        "Executing job {} in {}: {}",
        job_id,
        project_id,
        request.configuration.query.query
    );

    let job = state
        .warehouse
        .run_query(&project_id, &request.configuration.query.query, &job_id)?;
    Ok(Json(JobResource::from_job(&job)))
}

/// Job lookup handler
///
/// GET /projects/{projectId}/jobs/{jobId}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path((_project_id, job_id)): Path<(String, String)>,
) -> ApiResult<JobResource> {
    let job = state.warehouse.get_job(&job_id)?;
    Ok(Json(JobResource::from_job(&job)))
}

/// Query results handler
///
/// GET /projects/{projectId}/queries/{jobId}
///
/// Job ids are global, so the envelope reports the project that ran the job.
pub async fn get_query_results(
    State(state): State<Arc<AppState>>,
    Path((_project_id, job_id)): Path<(String, String)>,
) -> ApiResult<GetQueryResultsResponse> {
    tracing::info!("Getting results for job: {}", job_id);

    let job = state.warehouse.get_job(&job_id)?;
    Ok(Json(GetQueryResultsResponse::new(
        &job.project,
        &job.id,
        &job.result,
    )))
}
