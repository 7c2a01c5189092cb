//! Pipeline orchestration: stage registry, queue populator, dispatch
//! table, and the worker pool.

pub mod dispatch;
pub mod populate;
pub mod registry;
pub mod worker;

pub use dispatch::Dispatch;
pub use populate::Populator;
pub use registry::Stage;
pub use worker::{Tick, Worker, WorkerConfig, WorkerPool};
