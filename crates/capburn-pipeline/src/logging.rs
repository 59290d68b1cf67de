//! Structured job logging.
//!
//! Every line carries the job id and operation so that one render can be
//! followed across steps; step lines also carry the step name.

use tracing::{error, info, warn, Span};

use capburn_models::JobId;

/// Job logger with consistent lifecycle lines.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for a job and operation (e.g. "render").
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create a logger from a raw job id string.
    pub fn from_string(job_id: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log the completion of one pipeline step.
    pub fn log_step(&self, step: &str, elapsed_ms: u128) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            step = step,
            elapsed_ms = elapsed_ms as u64,
            "Step finished: {}", step
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a non-fatal degradation.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, step: &str, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            step = step,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::from_string("job-42");
        let logger = JobLogger::new(&job_id, "render");

        assert_eq!(logger.job_id(), "job-42");
        assert_eq!(logger.operation(), "render");
    }

    #[test]
    fn test_job_logger_from_string() {
        let logger = JobLogger::from_string("test-job-123", "render");
        assert_eq!(logger.job_id(), "test-job-123");
        logger.log_step("encode", 12);
    }
}
