//! Stage collaborators.
//!
//! Each stage is an independent, possibly slow, possibly-failing
//! external call behind [`StageHandler`]. A handler reads the person
//! fields it needs, performs its work, persists its own result columns,
//! and sets its own completion flag. The returned bool answers one
//! question: should the pipeline advance this person to the next stage.

pub mod cleaner;
pub mod llm;
pub mod perp;
pub mod postcheck1;
pub mod postcheck2;
pub mod prellm;

use crate::error::Result;

/// Number of internal attempts a stage may make against a flaky
/// provider before giving up. Collaborator-internal policy; the queue
/// engine only sees the final result.
pub const MAX_ATTEMPTS: usize = 3;

#[async_trait::async_trait]
pub trait StageHandler: Send + Sync {
    async fn process(&self, worker_id: usize, person_id: i64) -> Result<bool>;
}
