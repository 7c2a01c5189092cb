//! Core data model: tasks and person records.

pub mod person;
pub mod task;

pub use person::PersonRecord;
pub use task::{ClaimedTask, Task, TaskStatus};
