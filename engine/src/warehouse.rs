//! Warehouse
//!
//! Owns the catalog and the job ledger behind a single lock. Every
//! operation the wire layer needs goes through here.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value as JsonValue};

use crate::catalog::{Catalog, Dataset, Table};
use crate::coercion;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::jobs::{Job, JobLedger};
use crate::types::{Field, QueryResult};

/// Dataset metadata snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub project: String,
    pub dataset: String,
    pub created_at: DateTime<Utc>,
}

impl DatasetInfo {
    fn new(project: &str, dataset: &Dataset) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.name().to_string(),
            created_at: dataset.created_at(),
        }
    }
}

/// Table metadata snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub project: String,
    pub dataset: String,
    pub table: String,
    pub fields: Vec<Field>,
    pub num_rows: usize,
    pub created_at: DateTime<Utc>,
}

impl TableInfo {
    fn new(project: &str, dataset: &str, table: &Table) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.name().to_string(),
            fields: table.fields().to_vec(),
            num_rows: table.num_rows(),
            created_at: table.created_at(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    catalog: Catalog,
    jobs: JobLedger,
}

/// In-memory warehouse
///
/// Mutations hold the write lock for their whole duration, so concurrent
/// requests observe a serial order and never a half-appended batch.
#[derive(Debug, Default)]
pub struct Warehouse {
    state: RwLock<State>,
}

impl Warehouse {
    /// Create an empty warehouse
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a project
    pub fn ensure_project(&self, project: &str) {
        self.state.write().catalog.ensure_project(project);
    }

    /// Create the project on first reference; known projects only need the
    /// read lock. Projects are never removed.
    fn touch_project(&self, project: &str) {
        if self.state.read().catalog.project(project).is_err() {
            self.state.write().catalog.ensure_project(project);
        }
    }

    /// Create a dataset
    pub fn create_dataset(&self, project: &str, dataset: &str) -> Result<DatasetInfo> {
        let mut state = self.state.write();
        let created = state.catalog.create_dataset(project, dataset)?;
        tracing::info!("Created dataset {}:{}", project, dataset);
        Ok(DatasetInfo::new(project, created))
    }

    /// Get dataset metadata
    pub fn get_dataset(&self, project: &str, dataset: &str) -> Result<DatasetInfo> {
        self.touch_project(project);
        let state = self.state.read();
        let found = state.catalog.dataset(project, dataset)?;
        Ok(DatasetInfo::new(project, found))
    }

    /// List datasets of a project in name order
    pub fn list_datasets(&self, project: &str) -> Vec<DatasetInfo> {
        self.touch_project(project);
        let state = self.state.read();
        state
            .catalog
            .list_datasets(project)
            .unwrap_or_default()
            .iter()
            .filter_map(|name| state.catalog.dataset(project, name).ok())
            .map(|dataset| DatasetInfo::new(project, dataset))
            .collect()
    }

    /// Create a table with a fixed schema
    pub fn create_table(
        &self,
        project: &str,
        dataset: &str,
        table: &str,
        fields: Vec<Field>,
    ) -> Result<TableInfo> {
        let mut state = self.state.write();
        let created = state.catalog.create_table(project, dataset, table, fields)?;
        tracing::info!(
            "Created table {}:{}.{} with {} fields",
            project,
            dataset,
            table,
            created.fields().len()
        );
        Ok(TableInfo::new(project, dataset, created))
    }

    /// Get table metadata
    pub fn get_table(&self, project: &str, dataset: &str, table: &str) -> Result<TableInfo> {
        self.touch_project(project);
        let state = self.state.read();
        let found = state.catalog.table(project, dataset, table)?;
        Ok(TableInfo::new(project, dataset, found))
    }

    /// List tables of a dataset in name order
    pub fn list_tables(&self, project: &str, dataset: &str) -> Result<Vec<TableInfo>> {
        self.touch_project(project);
        let state = self.state.read();
        let names = state.catalog.list_tables(project, dataset)?;
        names
            .iter()
            .map(|name| {
                let table = state.catalog.table(project, dataset, name)?;
                Ok::<_, Error>(TableInfo::new(project, dataset, table))
            })
            .collect()
    }

    /// Append rows to a table
    ///
    /// All rows are coerced before any is stored; one bad row rejects the
    /// whole batch. Returns the number of rows appended.
    pub fn insert_rows(
        &self,
        project: &str,
        dataset: &str,
        table: &str,
        rows: &[Map<String, JsonValue>],
    ) -> Result<usize> {
        let mut state = self.state.write();
        state.catalog.ensure_project(project);
        let target = state.catalog.table_mut(project, dataset, table)?;

        let coerced = rows
            .iter()
            .map(|row| coercion::coerce_row(target.fields(), row))
            .collect::<Result<Vec<_>>>()?;
        let count = coerced.len();
        target.append_rows(coerced);

        tracing::info!(
            "Inserted {} rows into {}:{}.{} ({} total)",
            count,
            project,
            dataset,
            table,
            target.num_rows()
        );
        Ok(count)
    }

    /// Run a query as job `job_id` and record its result
    ///
    /// The query executes under the same guard that records the result. A
    /// failed query records nothing.
    pub fn run_query(&self, project: &str, query: &str, job_id: &str) -> Result<Job> {
        let mut state = self.state.write();
        let result = Executor::new(&state.catalog).execute(project, query)?;

        tracing::info!(
            "Job {} completed with {} rows: {}",
            job_id,
            result.total_rows(),
            query
        );
        let job = state.jobs.record(Job {
            id: job_id.to_string(),
            project: project.to_string(),
            query: query.to_string(),
            result,
            created_at: Utc::now(),
        });
        Ok(job.clone())
    }

    /// Get a completed job
    pub fn get_job(&self, job_id: &str) -> Result<Job> {
        self.state.read().jobs.get(job_id).cloned()
    }

    /// Get the result recorded for a job
    pub fn get_job_result(&self, job_id: &str) -> Result<QueryResult> {
        self.get_job(job_id).map(|job| job.result)
    }
}
