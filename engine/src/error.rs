//! Error types for the BigQuery emulator

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Not found: Project {0}")]
    ProjectNotFound(String),

    #[error("Not found: Dataset {project}:{dataset}")]
    DatasetNotFound { project: String, dataset: String },

    #[error("Not found: Table {project}:{dataset}.{table}")]
    TableNotFound {
        project: String,
        dataset: String,
        table: String,
    },

    #[error("Not found: Job {0}")]
    JobNotFound(String),

    #[error("Already Exists: Dataset {project}:{dataset}")]
    DatasetAlreadyExists { project: String, dataset: String },

    #[error("Already Exists: Table {project}:{dataset}.{table}")]
    TableAlreadyExists {
        project: String,
        dataset: String,
        table: String,
    },

    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Syntax error: {0}")]
    QuerySyntax(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Return the BigQuery error reason
    pub fn reason(&self) -> &'static str {
        match self {
            Error::ProjectNotFound(_)
            | Error::DatasetNotFound { .. }
            | Error::TableNotFound { .. }
            | Error::JobNotFound(_) => "notFound",
            Error::DatasetAlreadyExists { .. } | Error::TableAlreadyExists { .. } => "duplicate",
            Error::Validation(_) => "invalid",
            Error::QuerySyntax(_) => "invalidQuery",
        }
    }

    /// Return the HTTP status code BigQuery answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::ProjectNotFound(_)
            | Error::DatasetNotFound { .. }
            | Error::TableNotFound { .. }
            | Error::JobNotFound(_) => 404,
            Error::DatasetAlreadyExists { .. } | Error::TableAlreadyExists { .. } => 409,
            Error::Validation(_) | Error::QuerySyntax(_) => 400,
        }
    }

    /// Return the canonical status name used in the error envelope
    pub fn status(&self) -> &'static str {
        match self.status_code() {
            404 => "NOT_FOUND",
            409 => "ALREADY_EXISTS",
            _ => "INVALID_ARGUMENT",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}
