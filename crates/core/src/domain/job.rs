// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job State
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Executing,
    Completed,
    Failed,
    Canceled,
}

impl JobState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Canceled
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::Executing => write!(f, "EXECUTING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// What to run: job class plus the deployment units it is loaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub job_class_name: String,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl JobDescriptor {
    pub fn new(job_class_name: impl Into<String>) -> Self {
        Self {
            job_class_name: job_class_name.into(),
            units: Vec::new(),
            args: serde_json::Value::Null,
        }
    }

    pub fn with_units(mut self, units: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.units = units.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.job_class_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "job class name cannot be empty".to_string(),
            ));
        }
        if self.units.iter().any(|u| u.trim().is_empty()) {
            return Err(DomainError::ValidationError(
                "deployment unit name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Status of one job execution on one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub state: JobState,
    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl JobStatus {
    /// New queued status with injected ID and creation time
    pub fn new(id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            state: JobState::Queued,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Transition to Executing state with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        self.transition(JobState::Queued, JobState::Executing)?;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Completed state with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        self.transition(JobState::Executing, JobState::Completed)?;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed. A queued job may fail without ever starting
    /// (e.g. its node left the cluster before dispatch).
    pub fn fail(&mut self, now_millis: i64) -> Result<()> {
        if self.state.is_final() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Failed.to_string(),
            });
        }
        self.state = JobState::Failed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        if self.state.is_final() {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Canceled.to_string(),
            });
        }
        self.state = JobState::Canceled;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    fn transition(&mut self, expected: JobState, to: JobState) -> Result<()> {
        if self.state != expected {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lifecycle() {
        let mut status = JobStatus::new("job-1", 1000);
        assert_eq!(status.state, JobState::Queued);

        status.start(2000).unwrap();
        assert_eq!(status.state, JobState::Executing);
        assert_eq!(status.started_at, Some(2000));

        status.complete(3000).unwrap();
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.finished_at, Some(3000));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut status = JobStatus::new("job-2", 1000);

        // QUEUED -> COMPLETED is not allowed
        let err = status.complete(2000).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "QUEUED".to_string(),
                to: "COMPLETED".to_string(),
            }
        );

        // Failing from QUEUED is allowed, but a final state is sticky
        status.fail(2000).unwrap();
        assert!(status.start(3000).is_err());
        assert!(status.cancel(3000).is_err());
        assert_eq!(status.state, JobState::Failed);
    }

    #[test]
    fn test_descriptor_validation() {
        assert!(JobDescriptor::new("org.example.Echo").validate().is_ok());
        assert!(JobDescriptor::new("  ").validate().is_err());
        assert!(JobDescriptor::new("Echo")
            .with_units(["unit-a", ""])
            .validate()
            .is_err());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&JobState::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}
