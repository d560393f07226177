//! Prometheus metrics exposition
//!
//! Refresh counters are recorded by `refresh-guard`:
//!
//! - `auth_refresh_total` (counter): label `outcome`
//! - `auth_request_retries_total` (counter): label `outcome`
//!
//! The CLI is short-lived, so instead of serving `/metrics` the rendered
//! exposition is printed on exit when `--print-metrics` is passed.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
