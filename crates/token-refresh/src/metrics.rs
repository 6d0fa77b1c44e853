//! Refresh metrics
//!
//! Recorded through the `metrics` facade; the binary decides where they go.
//!
//! - `token_refresh_fetch_total` (counter): label `refresher`
//! - `token_refresh_cycles_total` (counter): labels `refresher`, `outcome`
//! - `token_refresh_available` (gauge): label `refresher`, 1 once a token is cached

/// How a refresh cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Ok,
    FetchFailed,
    CallbackFailed,
    Stopped,
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Ok => "ok",
            CycleOutcome::FetchFailed => "fetch_failed",
            CycleOutcome::CallbackFailed => "callback_failed",
            CycleOutcome::Stopped => "stopped",
        }
    }
}

/// Count one call into a token source.
pub fn record_fetch(refresher: &str) {
    metrics::counter!("token_refresh_fetch_total", "refresher" => refresher.to_string())
        .increment(1);
}

/// Count one finished refresh cycle.
pub fn record_cycle(refresher: &str, outcome: CycleOutcome) {
    metrics::counter!(
        "token_refresh_cycles_total",
        "refresher" => refresher.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);
}

/// Flag whether the refresher has a cached token.
pub fn set_available(refresher: &str, available: bool) {
    metrics::gauge!("token_refresh_available", "refresher" => refresher.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_fetch("IA-cli_x-app");
        record_cycle("IA-cli_x-app", CycleOutcome::Ok);
        set_available("IA-cli_x-app", true);
    }

    #[test]
    fn cycles_are_labelled_by_outcome() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_cycle("IA-cli_x-app", CycleOutcome::Ok);
        record_cycle("IA-cli_x-app", CycleOutcome::FetchFailed);
        record_cycle("IA-cli_x-tenant", CycleOutcome::CallbackFailed);

        let output = handle.render();
        assert!(output.contains("token_refresh_cycles_total"));
        assert!(output.contains("outcome=\"ok\""));
        assert!(output.contains("outcome=\"fetch_failed\""));
        assert!(output.contains("outcome=\"callback_failed\""));
        assert!(output.contains("refresher=\"IA-cli_x-tenant\""));
    }

    #[test]
    fn fetches_and_availability_recorded() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_fetch("PA-cli_y-app");
        record_fetch("PA-cli_y-app");
        set_available("PA-cli_y-app", true);

        let output = handle.render();
        assert!(
            output.contains("token_refresh_fetch_total{refresher=\"PA-cli_y-app\"} 2"),
            "got: {output}"
        );
        assert!(
            output.contains("token_refresh_available{refresher=\"PA-cli_y-app\"} 1"),
            "got: {output}"
        );
    }
}
