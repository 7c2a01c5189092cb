//! Queue populator: fills the backlog in bulk or one person at a time.
//!
//! Both paths guard with NOT EXISTS over the queue (any status: a
//! done or failed task blocks re-insert of the same (person, stage))
//! plus the partial unique index on active tasks, so a concurrent
//! enqueue race cannot create duplicate pending rows. Re-running the
//! bulk fill with no intervening state change inserts nothing.

use crate::db::Db;
use crate::error::Result;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::{debug, info};

use super::registry::Stage;

pub struct Populator {
    db: Arc<Db>,
}

impl Populator {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Bulk fill: for every active stage, enqueue one pending task per
    /// eligible person whose completion flag is not yet set and who has
    /// no task of that type. Safe to re-run. Returns rows inserted.
    pub async fn fill_all(&self) -> Result<u64> {
        info!("filling task queue for all stages");
        let mut total = 0;
        for stage in Stage::ACTIVE {
            let inserted = self.fill_stage(stage).await?;
            debug!(stage = %stage, inserted, "stage fill complete");
            total += inserted;
        }
        info!(total, "task queue fill complete");
        Ok(total)
    }

    /// Enqueue all eligible persons for one stage.
    pub async fn fill_stage(&self, stage: Stage) -> Result<u64> {
        let sql = format!(
            "INSERT INTO task_queue (person_id, task_type, status)
             SELECT p.person_id, $1, 'pending'
             FROM person_result_data AS p
             WHERE {predicate}
               AND p.{flag} = FALSE
               AND NOT EXISTS (
                   SELECT 1 FROM task_queue tq
                   WHERE tq.person_id = p.person_id AND tq.task_type = $1
               )
             ON CONFLICT DO NOTHING",
            predicate = stage.eligibility_sql(),
            flag = stage.completion_flag(),
        );

        let inserted = sqlx::query(&sql)
            .bind(stage.as_str())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if inserted > 0 {
            metrics::tasks_enqueued().add(
                inserted,
                &[
                    KeyValue::new("task_type", stage.as_str()),
                    KeyValue::new("mode", "bulk"),
                ],
            );
        }

        Ok(inserted)
    }

    /// Enqueue one (person, stage) pair if the person is eligible and
    /// no task of that type exists yet. Used to advance a person after
    /// the previous stage succeeds; a no-op when the guard rejects it.
    pub async fn add_for_person(&self, person_id: i64, stage: Stage) -> Result<bool> {
        let sql = format!(
            "INSERT INTO task_queue (person_id, task_type, status)
             SELECT p.person_id, $1, 'pending'
             FROM person_result_data AS p
             WHERE p.person_id = $2
               AND {predicate}
               AND NOT EXISTS (
                   SELECT 1 FROM task_queue tq
                   WHERE tq.person_id = $2 AND tq.task_type = $1
               )
             ON CONFLICT DO NOTHING",
            predicate = stage.eligibility_sql(),
        );

        let inserted = sqlx::query(&sql)
            .bind(stage.as_str())
            .bind(person_id)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        if inserted > 0 {
            metrics::tasks_enqueued().add(
                1,
                &[
                    KeyValue::new("task_type", stage.as_str()),
                    KeyValue::new("mode", "single"),
                ],
            );
            debug!(person_id, stage = %stage, "task enqueued");
        } else {
            debug!(person_id, stage = %stage, "enqueue skipped by guard");
        }

        Ok(inserted > 0)
    }
}
