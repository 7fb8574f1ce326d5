// src/ingest/mod.rs
pub mod aggregate;
pub mod fetchers;
pub mod queue;
pub mod registry;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "aggregate_fetched_total",
            "Articles mapped out of provider payloads."
        );
        describe_counter!(
            "aggregate_articles_total",
            "Articles persisted through the alias gate."
        );
        describe_counter!(
            "aggregate_unknown_source_total",
            "Records skipped because their publisher has no alias."
        );
        describe_counter!("aggregate_pages_total", "Pages fetched successfully.");
        describe_counter!(
            "aggregate_saturated_total",
            "Lineages ended by upstream saturation."
        );
        describe_counter!("aggregate_fetch_errors_total", "Upstream fetch failures.");
        describe_counter!(
            "aggregate_jobs_failed_total",
            "Jobs that exhausted their retry budget."
        );
        describe_histogram!("aggregate_parse_ms", "Provider payload parse time in ms.");
    });
}
