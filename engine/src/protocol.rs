//! BigQuery REST API Protocol Types
//!
//! Request/response types compatible with the BigQuery v2 JSON API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Error;
use crate::jobs::Job;
use crate::types::{Field, QueryResult};
use crate::warehouse::{DatasetInfo, TableInfo};

/// Base URL the real service advertises
pub const GOOGLEAPIS_BASE_URL: &str = "https://www.googleapis.com";

/// Dataset reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    /// Project ID (optional on requests, defaults to the path)
    #[serde(default)]
    pub project_id: Option<String>,

    pub dataset_id: String,
}

/// Table reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub dataset_id: Option<String>,

    pub table_id: String,
}

/// Job reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    #[serde(default)]
    pub project_id: Option<String>,

    /// Job ID; generated by the server when omitted
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Table schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// POST /projects/{projectId}/datasets
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetRequest {
    pub dataset_reference: DatasetReference,
}

/// POST /projects/{projectId}/datasets/{datasetId}/tables
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub table_reference: TableReference,

    #[serde(default)]
    pub schema: TableSchema,
}

/// POST .../tables/{tableId}/insertAll
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest {
    #[serde(default)]
    pub rows: Vec<InsertRow>,
}

/// A single row of an insertAll request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRow {
    /// Deduplication ID (accepted, not enforced by the emulator)
    #[serde(default)]
    pub insert_id: Option<String>,

    pub json: Map<String, JsonValue>,
}

/// POST /projects/{projectId}/jobs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub configuration: JobConfiguration,

    #[serde(default)]
    pub job_reference: JobReference,
}

/// Job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    pub query: JobConfigurationQuery,
}

/// Query job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationQuery {
    pub query: String,

    /// Accepted for client compatibility; both dialects parse the same
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_legacy_sql: Option<bool>,
}

/// Dataset resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResource {
    pub kind: String,
    pub id: String,
    pub dataset_reference: DatasetReference,
    pub creation_time: String,
    pub location: String,
}

impl DatasetResource {
    pub fn from_info(info: &DatasetInfo) -> Self {
        Self {
            kind: "bigquery#dataset".to_string(),
            id: format!("{}:{}", info.project, info.dataset),
            dataset_reference: DatasetReference {
                project_id: Some(info.project.clone()),
                dataset_id: info.dataset.clone(),
            },
            creation_time: info.created_at.timestamp_millis().to_string(),
            location: "US".to_string(),
        }
    }
}

/// GET /projects/{projectId}/datasets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetList {
    pub kind: String,
    pub datasets: Vec<DatasetListEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListEntry {
    pub kind: String,
    pub id: String,
    pub dataset_reference: DatasetReference,
}

impl DatasetList {
    pub fn new(datasets: &[DatasetInfo]) -> Self {
        Self {
            kind: "bigquery#datasetList".to_string(),
            datasets: datasets
                .iter()
                .map(|info| {
                    let resource = DatasetResource::from_info(info);
                    DatasetListEntry {
                        kind: resource.kind,
                        id: resource.id,
                        dataset_reference: resource.dataset_reference,
                    }
                })
                .collect(),
        }
    }
}

/// Table resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResource {
    pub kind: String,
    pub id: String,
    pub table_reference: TableReference,
    pub schema: TableSchema,
    pub num_rows: String,
    pub creation_time: String,
    pub r#type: String,
}

impl TableResource {
    pub fn from_info(info: &TableInfo) -> Self {
        Self {
            kind: "bigquery#table".to_string(),
            id: table_id(info),
            table_reference: table_reference(info),
            schema: TableSchema {
                fields: info.fields.clone(),
            },
            num_rows: info.num_rows.to_string(),
            creation_time: info.created_at.timestamp_millis().to_string(),
            r#type: "TABLE".to_string(),
        }
    }
}

/// GET /projects/{projectId}/datasets/{datasetId}/tables
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableList {
    pub kind: String,
    pub tables: Vec<TableListEntry>,
    pub total_items: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableListEntry {
    pub kind: String,
    pub id: String,
    pub table_reference: TableReference,
    pub r#type: String,
    pub creation_time: String,
}

impl TableList {
    pub fn new(tables: &[TableInfo]) -> Self {
        Self {
            kind: "bigquery#tableList".to_string(),
            tables: tables
                .iter()
                .map(|info| TableListEntry {
                    kind: "bigquery#table".to_string(),
                    id: table_id(info),
                    table_reference: table_reference(info),
                    r#type: "TABLE".to_string(),
                    creation_time: info.created_at.timestamp_millis().to_string(),
                })
                .collect(),
            total_items: tables.len(),
        }
    }
}

/// insertAll response
#[derive(Debug, Clone, Serialize)]
pub struct InsertAllResponse {
    pub kind: String,
}

impl Default for InsertAllResponse {
    fn default() -> Self {
        Self {
            kind: "bigquery#tableDataInsertAllResponse".to_string(),
        }
    }
}

/// Job resource
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResource {
    pub kind: String,
    pub id: String,
    pub self_link: String,
    pub job_reference: JobReference,
    pub configuration: JobConfiguration,
    pub status: JobStatus,
    pub statistics: JobStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    pub creation_time: String,
    pub start_time: String,
    pub end_time: String,
    pub total_bytes_processed: String,
}

impl JobResource {
    pub fn from_job(job: &Job) -> Self {
        let millis = job.created_at.timestamp_millis().to_string();
        Self {
            kind: "bigquery#job".to_string(),
            id: format!("{}:{}", job.project, job.id),
            self_link: format!(
                "{GOOGLEAPIS_BASE_URL}/bigquery/v2/projects/{}/jobs/{}",
                job.project, job.id
            ),
            job_reference: JobReference {
                project_id: Some(job.project.clone()),
                job_id: Some(job.id.clone()),
            },
            configuration: JobConfiguration {
                query: JobConfigurationQuery {
                    query: job.query.clone(),
                    use_legacy_sql: None,
                },
            },
            // Jobs run synchronously, so they are always DONE
            status: JobStatus {
                state: "DONE".to_string(),
            },
            statistics: JobStatistics {
                creation_time: millis.clone(),
                start_time: millis.clone(),
                end_time: millis,
                total_bytes_processed: "0".to_string(),
            },
        }
    }
}

/// A result row: `{"f": [{"v": ...}, ...]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub f: Vec<TableCell>,
}

/// A result cell; every scalar is a string or null
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub v: Option<String>,
}

/// GET /projects/{projectId}/queries/{jobId}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQueryResultsResponse {
    pub kind: String,
    pub schema: TableSchema,
    pub job_reference: JobReference,
    pub total_rows: String,
    pub rows: Vec<TableRow>,
    pub total_bytes_processed: String,
    pub job_complete: bool,
    pub cache_hit: bool,
}

impl GetQueryResultsResponse {
    pub fn new(project: &str, job_id: &str, result: &QueryResult) -> Self {
        Self {
            kind: "bigquery#getQueryResultsResponse".to_string(),
            schema: TableSchema {
                fields: result.schema.clone(),
            },
            job_reference: JobReference {
                project_id: Some(project.to_string()),
                job_id: Some(job_id.to_string()),
            },
            total_rows: result.total_rows().to_string(),
            rows: result
                .rows
                .iter()
                .map(|row| TableRow {
                    f: row.iter().map(|v| TableCell { v: v.clone() }).collect(),
                })
                .collect(),
            total_bytes_processed: "0".to_string(),
            job_complete: true,
            cache_hit: true,
        }
    }
}

/// Error response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub status: String,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub domain: String,
    pub reason: String,
}

impl ErrorResponse {
    pub fn from_error(error: &Error) -> Self {
        let message = error.to_string();
        Self {
            error: ErrorBody {
                code: error.status_code(),
                message: message.clone(),
                status: error.status().to_string(),
                errors: vec![ErrorDetail {
                    message,
                    domain: "global".to_string(),
                    reason: error.reason().to_string(),
                }],
            },
        }
    }
}

fn table_id(info: &TableInfo) -> String {
    format!("{}:{}.{}", info.project, info.dataset, info.table)
}

fn table_reference(info: &TableInfo) -> TableReference {
    TableReference {
        project_id: Some(info.project.clone()),
        dataset_id: Some(info.dataset.clone()),
        table_id: info.table.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use serde_json::json;

    #[test]
    fn test_query_results_wire_format() {
        let result = QueryResult::new(
            vec![Field::nullable("x", FieldType::Integer)],
            vec![vec![Some("1".to_string())], vec![None]],
        );
        let response = serde_json::to_value(GetQueryResultsResponse::new("p", "j", &result)).unwrap();

        assert_eq!(response["kind"], "bigquery#getQueryResultsResponse");
        assert_eq!(response["totalRows"], "2");
        assert_eq!(response["jobComplete"], true);
        assert_eq!(response["jobReference"], json!({"projectId": "p", "jobId": "j"}));
        assert_eq!(
            response["schema"]["fields"],
            json!([{"name": "x", "type": "INTEGER", "mode": "NULLABLE"}])
        );
        assert_eq!(
            response["rows"],
            json!([{"f": [{"v": "1"}]}, {"f": [{"v": null}]}])
        );
    }

    #[test]
    fn test_create_job_request_without_job_id() {
        let request: CreateJobRequest = serde_json::from_value(json!({
            "configuration": {"query": {"query": "SELECT COUNT(*) FROM d.t", "useLegacySql": false}}
        }))
        .unwrap();

        assert_eq!(request.configuration.query.query, "SELECT COUNT(*) FROM d.t");
        assert_eq!(request.job_reference.job_id, None);
    }

    #[test]
    fn test_create_table_request() {
        let request: CreateTableRequest = serde_json::from_value(json!({
            "tableReference": {"projectId": "p", "datasetId": "d", "tableId": "t"},
            "schema": {"fields": [
                {"name": "at", "type": "TIMESTAMP", "mode": "REQUIRED"},
                {"name": "n", "type": "FLOAT"}
            ]}
        }))
        .unwrap();

        assert_eq!(request.table_reference.table_id, "t");
        assert_eq!(request.schema.fields.len(), 2);
        assert_eq!(request.schema.fields[1].r#type, FieldType::Float);
    }

    #[test]
    fn test_error_envelope() {
        let error = Error::TableNotFound {
            project: "p".to_string(),
            dataset: "d".to_string(),
            table: "t".to_string(),
        };
        let body = serde_json::to_value(ErrorResponse::from_error(&error)).unwrap();

        assert_eq!(body["error"]["code"], 404);
        assert_eq!(body["error"]["status"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Not found: Table p:d.t");
        assert_eq!(body["error"]["errors"][0]["reason"], "notFound");
    }
}
