//! Query parser
//!
//! The emulator understands exactly two query shapes:
//!
//! ```sql
//! SELECT COUNT(*) FROM dataset.table
//! SELECT * FROM dataset.table [LIMIT n]
//! ```
//!
//! Keywords are case-insensitive. Identifiers are taken verbatim and may not
//! be quoted; exactly one `.` separates the dataset from the table.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static COUNT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^SELECT\s+COUNT\s*\(\s*\*\s*\)\s+FROM\s+([^.\s]+)\.([^.\s]+)$")
        .expect("COUNT(*) pattern is valid")
});

static SELECT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^SELECT\s+\*\s+FROM\s+([^.\s]+)\.([^.\s]+)(?:\s+LIMIT\s+([0-9]+))?$")
        .expect("SELECT * pattern is valid")
});

/// A recognized query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `SELECT COUNT(*) FROM dataset.table`
    CountStar { dataset: String, table: String },

    /// `SELECT * FROM dataset.table [LIMIT n]`
    SelectStar {
        dataset: String,
        table: String,
        limit: Option<usize>,
    },
}

impl Statement {
    /// Dataset and table the statement reads from
    pub fn table_ref(&self) -> (&str, &str) {
        match self {
            Statement::CountStar { dataset, table } | Statement::SelectStar { dataset, table, .. } => {
                (dataset.as_str(), table.as_str())
            }
        }
    }
}

/// Parse query text into a statement
pub fn parse(sql: &str) -> Result<Statement> {
    let sql = sql.trim();

    if let Some(caps) = COUNT_STAR.captures(sql) {
        tracing::debug!("Parsed COUNT(*) over {}.{}", &caps[1], &caps[2]);
        return Ok(Statement::CountStar {
            dataset: caps[1].to_string(),
            table: caps[2].to_string(),
        });
    }

    if let Some(caps) = SELECT_STAR.captures(sql) {
        let limit = caps
            .get(3)
            .map(|m| {
                m.as_str().parse::<usize>().map_err(|_| {
                    Error::QuerySyntax(format!("LIMIT value {} is out of range", m.as_str()))
                })
            })
            .transpose()?;

        tracing::debug!(
            "Parsed SELECT * over {}.{} (limit={:?})",
            &caps[1],
            &caps[2],
            limit
        );
        return Ok(Statement::SelectStar {
            dataset: caps[1].to_string(),
            table: caps[2].to_string(),
            limit,
        });
    }

    Err(Error::QuerySyntax(format!("Unsupported query: {sql}")))
}
