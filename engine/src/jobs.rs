//! Job ledger
//!
//! Every job runs to completion when it is created, so the ledger only
//! remembers finished results keyed by job id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::types::QueryResult;

/// A completed query job
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub project: String,
    pub query: String,
    pub result: QueryResult,
    pub created_at: DateTime<Utc>,
}

/// Job id -> completed job
#[derive(Debug, Default)]
pub struct JobLedger {
    jobs: HashMap<String, Job>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job, replacing any earlier job with the same id
    pub fn record(&mut self, job: Job) -> &Job {
        if self.jobs.contains_key(&job.id) {
            tracing::debug!("Replacing result of job {}", job.id);
        }
        let id = job.id.clone();
        self.jobs.insert(id.clone(), job);
        &self.jobs[&id]
    }

    pub fn get(&self, job_id: &str) -> Result<&Job> {
        self.jobs
            .get(job_id)
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, count: &str) -> Job {
        Job {
            id: id.to_string(),
            project: "p".to_string(),
            query: "SELECT COUNT(*) FROM d.t".to_string(),
            result: QueryResult::new(vec![], vec![vec![Some(count.to_string())]]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unknown_job_not_found() {
        let ledger = JobLedger::new();
        assert_eq!(
            ledger.get("nope").unwrap_err(),
            Error::JobNotFound("nope".to_string())
        );
    }

    #[test]
    fn test_last_write_wins() {
        let mut ledger = JobLedger::new();
        ledger.record(job("j", "1"));
        ledger.record(job("j", "2"));

        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.get("j").unwrap().result.rows,
            vec![vec![Some("2".to_string())]]
        );
    }
}
