//! Query executor
//!
//! Runs parsed statements against a catalog snapshot and produces
//! stringified results.

use crate::catalog::{Catalog, Table};
use crate::coercion;
use crate::error::Result;
use crate::parser::{self, Statement};
use crate::types::{Field, FieldMode, FieldType, QueryResult};

/// Name BigQuery gives to an unaliased first output column
const ANONYMOUS_COLUMN: &str = "f0_";

/// Query execution engine
///
/// Borrows the catalog for the duration of one query, so the caller's lock
/// guard pins a consistent snapshot of every table it reads.
pub struct Executor<'a> {
    catalog: &'a Catalog,
}

impl<'a> Executor<'a> {
    /// Create a new executor over a catalog
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Parse and execute query text issued from `project`
    pub fn execute(&self, project: &str, sql: &str) -> Result<QueryResult> {
        let statement = parser::parse(sql)?;
        self.execute_statement(project, &statement)
    }

    /// Execute an already parsed statement
    pub fn execute_statement(&self, project: &str, statement: &Statement) -> Result<QueryResult> {
        let (dataset, table) = statement.table_ref();
        let table = self.catalog.table(project, dataset, table)?;

        let result = match statement {
            Statement::CountStar { .. } => self.count_star(table),
            Statement::SelectStar { limit, .. } => self.select_star(table, *limit),
        };

        tracing::debug!(
            "Query over {}:{}.{} returned {} rows",
            project,
            dataset,
            table.name(),
            result.total_rows()
        );
        Ok(result)
    }

    /// Handle `SELECT COUNT(*)`
    fn count_star(&self, table: &Table) -> QueryResult {
        QueryResult::new(
            vec![Field::new(
                ANONYMOUS_COLUMN,
                FieldType::Integer,
                FieldMode::Nullable,
            )],
            vec![vec![Some(table.num_rows().to_string())]],
        )
    }

    /// Handle `SELECT * [LIMIT n]`
    ///
    /// A limit beyond the row count returns every row.
    fn select_star(&self, table: &Table, limit: Option<usize>) -> QueryResult {
        let rows = table.rows();
        let take = limit.map_or(rows.len(), |n| n.min(rows.len()));

        let data = rows[..take]
            .iter()
            .map(|row| coercion::format_row(table.fields(), row))
            .collect();

        QueryResult::new(table.fields().to_vec(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::coerce_row;
    use crate::error::Error;
    use serde_json::{json, Value as JsonValue};

    fn catalog_with_rows(fields: Vec<Field>, rows: Vec<JsonValue>) -> Catalog {
        let mut catalog = Catalog::new();
        catalog.create_dataset("p", "d").unwrap();
        catalog.create_table("p", "d", "t", fields).unwrap();

        let table = catalog.table_mut("p", "d", "t").unwrap();
        let rows: Vec<_> = rows
            .iter()
            .map(|row| coerce_row(table.fields(), row.as_object().unwrap()).unwrap())
            .collect();
        table.append_rows(rows);
        catalog
    }

    fn single_int_column(n: i64) -> Catalog {
        catalog_with_rows(
            vec![Field::nullable("x", FieldType::Integer)],
            (1..=n).map(|x| json!({ "x": x })).collect(),
        )
    }

    fn strings(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_count_star_empty_table() {
        let catalog = single_int_column(0);
        let result = Executor::new(&catalog)
            .execute("p", "SELECT COUNT(*) FROM d.t")
            .unwrap();

        assert_eq!(
            result.schema,
            vec![Field::new("f0_", FieldType::Integer, FieldMode::Nullable)]
        );
        assert_eq!(result.rows, vec![strings(&["0"])]);
    }

    #[test]
    fn test_count_star_counts_rows() {
        let catalog = single_int_column(3);
        let result = Executor::new(&catalog)
            .execute("p", "SELECT COUNT(*) FROM d.t")
            .unwrap();
        assert_eq!(result.rows, vec![strings(&["3"])]);
    }

    #[test]
    fn test_select_star_with_limit() {
        let catalog = single_int_column(3);
        let result = Executor::new(&catalog)
            .execute("p", "SELECT * FROM d.t LIMIT 2")
            .unwrap();

        assert_eq!(
            result.schema,
            vec![Field::nullable("x", FieldType::Integer)]
        );
        assert_eq!(result.rows, vec![strings(&["1"]), strings(&["2"])]);
    }

    #[test]
    fn test_limit_beyond_row_count_is_clamped() {
        let catalog = single_int_column(3);
        let executor = Executor::new(&catalog);

        let result = executor.execute("p", "SELECT * FROM d.t LIMIT 10").unwrap();
        assert_eq!(result.total_rows(), 3);

        let result = executor.execute("p", "SELECT * FROM d.t LIMIT 0").unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.schema.len(), 1);
    }

    #[test]
    fn test_select_star_projects_schema_order() {
        let catalog = catalog_with_rows(
            vec![
                Field::nullable("at", FieldType::Timestamp),
                Field::nullable("score", FieldType::Float),
                Field::nullable("name", FieldType::String),
            ],
            vec![
                json!({"name": "a", "score": 3.0, "at": "2023-01-01T00:00:00Z"}),
                json!({"score": 3.14, "name": "b"}),
            ],
        );

        let result = Executor::new(&catalog)
            .execute("p", "SELECT * FROM d.t")
            .unwrap();

        assert_eq!(
            result.rows,
            vec![
                strings(&["1672531200", "3", "a"]),
                vec![None, Some("3.14".to_string()), Some("b".to_string())],
            ]
        );
    }

    #[test]
    fn test_missing_entities_are_not_found() {
        let catalog = single_int_column(1);
        let executor = Executor::new(&catalog);

        assert!(matches!(
            executor.execute("other", "SELECT * FROM d.t"),
            Err(Error::ProjectNotFound(_))
        ));
        assert!(matches!(
            executor.execute("p", "SELECT * FROM nope.t"),
            Err(Error::DatasetNotFound { .. })
        ));
        assert!(matches!(
            executor.execute("p", "SELECT COUNT(*) FROM d.nope"),
            Err(Error::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_syntax_checked_before_resolution() {
        let catalog = Catalog::new();
        let err = Executor::new(&catalog)
            .execute("p", "SELECT name FROM nope.nope")
            .unwrap_err();
        assert!(matches!(err, Error::QuerySyntax(_)));
    }
}
