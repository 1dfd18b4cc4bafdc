use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once per process (the binary does; tests don't,
    /// so metric macros stay no-ops there).
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!(
            "persona_metadata_errors_total",
            "Profile metadata fetches that fell back to an empty record."
        );
        describe_counter!("persona_parse_total", "Completions parsed, by stage.");
        describe_counter!(
            "persona_parse_failures_total",
            "Completions that failed both strict and loose parsing."
        );
        describe_counter!(
            "persona_generation_attempts_total",
            "Prompt -> gateway -> parse round trips started."
        );
        describe_counter!(
            "persona_generation_failures_total",
            "Persona requests that exhausted every attempt."
        );
        describe_histogram!(
            "persona_generation_attempts",
            "Attempts needed by successful persona requests."
        );

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format; merged into the app by the binary.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
    }
}
