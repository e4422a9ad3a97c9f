//! Core metrics definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `_total` suffix for counters
//! - `_seconds` suffix for histograms measuring duration

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Register all core metrics with descriptions.
pub fn register_core_metrics() {
    // Stack lifecycle metrics
    describe_histogram!(
        "herogate_stack_operation_duration_seconds",
        "Time taken by a stack operation (by operation: create, destroy, update)"
    );
    describe_counter!(
        "herogate_stack_operation_failures_total",
        "Total number of failed stack operations (by operation)"
    );

    // Template metrics
    describe_counter!(
        "herogate_template_mutations_total",
        "Total number of template mutations submitted (by kind)"
    );

    // Log metrics
    describe_counter!(
        "herogate_log_entries_fetched_total",
        "Total number of log entries fetched (by process)"
    );

    describe_counter!(
        "herogate_provider_errors_total",
        "Total number of provider calls that failed (by operation)"
    );
}

pub fn record_stack_operation(operation: &'static str, duration_secs: f64) {
    histogram!("herogate_stack_operation_duration_seconds", "operation" => operation)
        .record(duration_secs);
}

pub fn record_stack_failure(operation: &'static str) {
    counter!("herogate_stack_operation_failures_total", "operation" => operation).increment(1);
}

pub fn record_template_mutation(kind: &'static str) {
    counter!("herogate_template_mutations_total", "kind" => kind).increment(1);
}

pub fn record_log_entries(process: &'static str, count: usize) {
    counter!("herogate_log_entries_fetched_total", "process" => process).increment(count as u64);
}

pub fn record_provider_error(operation: &'static str) {
    counter!("herogate_provider_errors_total", "operation" => operation).increment(1);
}
