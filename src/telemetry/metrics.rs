//! Metric instrument factories.
//!
//! Uses the OTel Meter API with the globally-registered MeterProvider;
//! instruments are created lazily from the `"enrichq"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("enrichq")
}

/// Counter: tasks inserted into the queue.
/// Labels: `task_type`, `mode` ("bulk" | "single").
pub fn tasks_enqueued() -> Counter<u64> {
    meter()
        .u64_counter("enrichq.tasks.enqueued")
        .with_description("Number of tasks inserted into the queue")
        .build()
}

/// Counter: queue-level operations (claim, claim_empty, requeue).
/// Labels: `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("enrichq.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Counter: terminal task outcomes.
/// Labels: `result` ("done" | "failed").
pub fn task_completions() -> Counter<u64> {
    meter()
        .u64_counter("enrichq.tasks.completions")
        .with_description("Number of tasks reaching a terminal status")
        .build()
}

/// Histogram: stage execution duration in milliseconds.
/// Labels: `task_type`.
pub fn stage_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("enrichq.stage.duration_ms")
        .with_description("Stage execution duration in milliseconds")
        .with_unit("ms")
        .build()
}
