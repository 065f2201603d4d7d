//! Metric instruments, created from the global `"proofdesk"` meter.
//!
//! With no meter provider installed these are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("proofdesk")
}

/// Counter: issue position resolutions.
/// Labels: `source` ("plain_text_position" | "text_search" | "not_found").
pub fn positions_resolved() -> Counter<u64> {
    meter()
        .u64_counter("proofdesk.positions.resolved")
        .with_description("Number of issue positions resolved")
        .build()
}

/// Counter: issues left out of the render sequence.
/// Labels: `reason` ("not_found" | "overlap").
pub fn issues_dropped() -> Counter<u64> {
    meter()
        .u64_counter("proofdesk.issues.dropped")
        .with_description("Number of issues omitted from rendering")
        .build()
}

/// Counter: review decisions.
/// Labels: `decision_type`, `result` ("ok" | "error").
pub fn decisions_recorded() -> Counter<u64> {
    meter()
        .u64_counter("proofdesk.decisions.recorded")
        .with_description("Number of review decisions recorded")
        .build()
}

/// Counter: worklist status transitions.
/// Labels: `from`, `to`.
pub fn worklist_transitions() -> Counter<u64> {
    meter()
        .u64_counter("proofdesk.worklist.transitions")
        .with_description("Number of worklist status transitions")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("proofdesk.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
