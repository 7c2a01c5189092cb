//! Task execution span helpers.

use tracing::Span;

/// Start a span covering one claimed task from dispatch to completion.
pub fn start_task_span(stage: &str, task_id: i64, person_id: i64) -> Span {
    tracing::info_span!(
        "task.execute",
        "task.stage" = stage,
        "task.id" = task_id,
        "task.person_id" = person_id,
    )
}
