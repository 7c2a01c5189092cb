//! Queue task model.
//!
//! A task is one unit of work: one person, one stage. It has a
//! monotonic lifecycle (pending → in_progress → done | failed) and
//! failure bookkeeping; the engine never reopens a terminal task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a queue task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a worker.
    Pending,
    /// Claimed by exactly one worker.
    InProgress,
    /// Finished successfully. Terminal.
    Done,
    /// Collaborator failed or panicked. Terminal for the engine;
    /// re-enqueue is an explicit operator action.
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(crate::error::Error::Other(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}

/// A full queue row, as read back for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub person_id: i64,
    pub task_type: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub retries: i32,
    pub last_error: Option<String>,
}

/// The identifying columns returned by a successful claim.
///
/// `task_type` stays a string here: the worker parses it against the
/// registry and a stale or unknown name fails that task, not the loop.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedTask {
    pub id: i64,
    pub person_id: i64,
    pub task_type: String,
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
pub(crate) struct TaskRow {
    pub id: i64,
    pub person_id: i64,
    pub task_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub retries: i32,
    pub last_error: Option<String>,
}

impl TaskRow {
    pub(crate) fn try_into_task(self) -> crate::error::Result<Task> {
        Ok(Task {
            id: self.id,
            person_id: self.person_id,
            task_type: self.task_type,
            status: self.status.parse()?,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            retries: self.retries,
            last_error: self.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn only_done_and_failed_are_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }
}
