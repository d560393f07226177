//! Refresh counters
//!
//! - `auth_refresh_total` (counter): label `outcome` =
//!   `started` | `joined` | `succeeded` | `failed` | `timed_out` | `abandoned`
//! - `auth_request_retries_total` (counter): label `outcome` =
//!   `recovered` | `rejected` | `failed`
//!
//! Without an installed recorder these calls are no-ops.

/// Record a refresh lifecycle event.
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("auth_refresh_total", "outcome" => outcome).increment(1);
}

/// Record the outcome of replaying a request with a refreshed credential.
pub fn record_retry(outcome: &'static str) {
    metrics::counter!("auth_request_retries_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_refresh("started");
        record_retry("recovered");
    }

    #[test]
    fn counters_carry_outcome_label() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_refresh("started");
        record_refresh("joined");
        record_retry("rejected");

        let output = handle.render();
        assert!(output.contains("auth_refresh_total"), "got: {output}");
        assert!(output.contains("outcome=\"started\""));
        assert!(output.contains("outcome=\"joined\""));
        assert!(output.contains("auth_request_retries_total"));
        assert!(output.contains("outcome=\"rejected\""));
    }
}
