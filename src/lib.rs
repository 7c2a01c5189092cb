//! # enrichq
//!
//! Postgres-backed task queue and worker orchestration for the person
//! enrichment pipeline.
//!
//! The core is the persisted queue (`db::queue`), its atomic claim
//! protocol, and the worker pool (`pipeline::worker`) driving a fixed
//! linear chain of enrichment stages. Stage implementations live in
//! `stages` and are reached only through the dispatch table.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod stages;
pub mod telemetry;
