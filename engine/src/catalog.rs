//! BigQuery Catalog Management
//!
//! Project, dataset, and table management

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::types::{Field, Row};

/// Table: fixed schema plus append-only rows
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    fields: Vec<Field>,
    rows: Vec<Row>,
    created_at: DateTime<Utc>,
}

impl Table {
    fn new(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            rows: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared schema, in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Stored rows, in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn append_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
    }
}

/// Dataset: a namespace of tables
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    tables: BTreeMap<String, Table>,
    created_at: DateTime<Utc>,
}

impl Dataset {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Table names in ascending order
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

/// Project: a namespace of datasets
#[derive(Debug, Clone, Default)]
pub struct Project {
    datasets: BTreeMap<String, Dataset>,
}

impl Project {
    /// Dataset names in ascending order
    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }
}

/// In-memory catalog
///
/// Holds the PROJECT -> DATASET -> TABLE hierarchy. It does no locking of
/// its own; the owning `Warehouse` serializes access.
#[derive(Debug, Default)]
pub struct Catalog {
    projects: HashMap<String, Project>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a project
    pub fn ensure_project(&mut self, name: &str) -> &mut Project {
        self.projects.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!("Creating project {}", name);
            Project::default()
        })
    }

    /// Get a project
    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Create a dataset, rejecting duplicate names
    pub fn create_dataset(&mut self, project: &str, dataset: &str) -> Result<&Dataset> {
        let datasets = &mut self.ensure_project(project).datasets;
        if datasets.contains_key(dataset) {
            return Err(Error::DatasetAlreadyExists {
                project: project.to_string(),
                dataset: dataset.to_string(),
            });
        }

        Ok(datasets
            .entry(dataset.to_string())
            .or_insert_with(|| Dataset::new(dataset)))
    }

    /// Get a dataset
    pub fn dataset(&self, project: &str, dataset: &str) -> Result<&Dataset> {
        self.project(project)?
            .datasets
            .get(dataset)
            .ok_or_else(|| dataset_not_found(project, dataset))
    }

    fn dataset_mut(&mut self, project: &str, dataset: &str) -> Result<&mut Dataset> {
        self.projects
            .get_mut(project)
            .ok_or_else(|| Error::ProjectNotFound(project.to_string()))?
            .datasets
            .get_mut(dataset)
            .ok_or_else(|| dataset_not_found(project, dataset))
    }

    /// Create a table in an existing dataset, rejecting duplicate names
    pub fn create_table(
        &mut self,
        project: &str,
        dataset: &str,
        table: &str,
        fields: Vec<Field>,
    ) -> Result<&Table> {
        let mut seen = HashSet::new();
        if let Some(field) = fields.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(Error::Validation(format!(
                "Field {} already exists in schema",
                field.name
            )));
        }

        self.ensure_project(project);
        let tables = &mut self.dataset_mut(project, dataset)?.tables;
        if tables.contains_key(table) {
            return Err(Error::TableAlreadyExists {
                project: project.to_string(),
                dataset: dataset.to_string(),
                table: table.to_string(),
            });
        }

        Ok(tables
            .entry(table.to_string())
            .or_insert_with(|| Table::new(table, fields)))
    }

    /// Get a table
    pub fn table(&self, project: &str, dataset: &str, table: &str) -> Result<&Table> {
        self.dataset(project, dataset)?
            .tables
            .get(table)
            .ok_or_else(|| table_not_found(project, dataset, table))
    }

    /// Get a table for appending rows
    pub fn table_mut(&mut self, project: &str, dataset: &str, table: &str) -> Result<&mut Table> {
        self.dataset_mut(project, dataset)?
            .tables
            .get_mut(table)
            .ok_or_else(|| table_not_found(project, dataset, table))
    }

    /// List dataset names of a project
    pub fn list_datasets(&self, project: &str) -> Result<Vec<String>> {
        Ok(self.project(project)?.dataset_names())
    }

    /// List table names of a dataset
    pub fn list_tables(&self, project: &str, dataset: &str) -> Result<Vec<String>> {
        Ok(self.dataset(project, dataset)?.table_names())
    }
}

fn dataset_not_found(project: &str, dataset: &str) -> Error {
    Error::DatasetNotFound {
        project: project.to_string(),
        dataset: dataset.to_string(),
    }
}

fn table_not_found(project: &str, dataset: &str, table: &str) -> Error {
    Error::TableNotFound {
        project: project.to_string(),
        dataset: dataset.to_string(),
        table: table.to_string(),
    }
}
