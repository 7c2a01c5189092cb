//! Queue store: atomic claim, completion, and inspection of tasks.
//!
//! The claim is a single transactional statement (an UPDATE over a
//! `FOR UPDATE SKIP LOCKED` subselect), so no two concurrent callers
//! can ever receive the same row, and a row locked by a slow claimant
//! is skipped rather than waited on. Ordering is therefore only
//! approximately oldest-first; throughput wins over strict FIFO.

use crate::error::{Error, Result};
use crate::model::task::TaskRow;
use crate::model::{ClaimedTask, Task};
use crate::pipeline::Stage;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;

impl super::Db {
    /// Atomically claim the oldest pending task whose type is in
    /// `stages`, marking it in_progress with a start timestamp.
    ///
    /// Returns `None` when no pending task is available, a normal and
    /// frequent condition rather than an error.
    pub async fn claim(&self, stages: &[Stage]) -> Result<Option<ClaimedTask>> {
        let types: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();

        let claimed: Option<ClaimedTask> = sqlx::query_as(
            "UPDATE task_queue
             SET status = 'in_progress', started_at = now()
             WHERE id = (
                 SELECT id FROM task_queue
                 WHERE status = 'pending' AND task_type = ANY($1)
                 ORDER BY created_at
                 FOR UPDATE SKIP LOCKED
                 LIMIT 1
             )
             RETURNING id, person_id, task_type",
        )
        .bind(&types)
        .fetch_optional(self.pool())
        .await?;

        metrics::queue_operations().add(
            1,
            &[KeyValue::new(
                "operation",
                if claimed.is_some() { "claim" } else { "claim_empty" },
            )],
        );

        Ok(claimed)
    }

    /// Complete an in_progress task: done when `error` is None, failed
    /// otherwise (incrementing `retries` and recording `last_error`).
    ///
    /// This is the only way a task leaves in_progress. The status guard
    /// keeps terminal states terminal; completing a task that is not
    /// in_progress is an error.
    pub async fn complete(&self, task_id: i64, error: Option<&str>) -> Result<()> {
        let rows_affected = match error {
            None => {
                sqlx::query(
                    "UPDATE task_queue
                     SET status = 'done', finished_at = now()
                     WHERE id = $1 AND status = 'in_progress'",
                )
                .bind(task_id)
                .execute(self.pool())
                .await?
                .rows_affected()
            }
            Some(message) => {
                sqlx::query(
                    "UPDATE task_queue
                     SET status = 'failed', finished_at = now(),
                         retries = retries + 1, last_error = $1
                     WHERE id = $2 AND status = 'in_progress'",
                )
                .bind(message)
                .bind(task_id)
                .execute(self.pool())
                .await?
                .rows_affected()
            }
        };

        if rows_affected == 0 {
            return Err(Error::TaskNotActive(task_id));
        }

        metrics::task_completions().add(
            1,
            &[KeyValue::new(
                "result",
                if error.is_none() { "done" } else { "failed" },
            )],
        );

        Ok(())
    }

    /// Manually re-enqueue a failed task. Nothing in the engine calls
    /// this automatically. Returns false if the task is not failed.
    pub async fn requeue_failed(&self, task_id: i64) -> Result<bool> {
        let rows_affected = sqlx::query(
            "UPDATE task_queue
             SET status = 'pending', started_at = NULL, finished_at = NULL
             WHERE id = $1 AND status = 'failed'",
        )
        .bind(task_id)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected > 0 {
            metrics::queue_operations().add(1, &[KeyValue::new("operation", "requeue")]);
        }

        Ok(rows_affected > 0)
    }

    /// Fetch a full task row by id.
    pub async fn get_task(&self, task_id: i64) -> Result<Task> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, person_id, task_type, status, created_at,
                    started_at, finished_at, retries, last_error
             FROM task_queue WHERE id = $1",
        )
        .bind(task_id)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(Error::TaskNotFound(task_id))?.try_into_task()
    }

    /// Task counts grouped by status, for the stats report.
    pub async fn task_status_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM task_queue GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
