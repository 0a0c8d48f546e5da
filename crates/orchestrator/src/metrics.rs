//! Orchestration metrics
//!
//! Recorded through the `metrics` facade; the embedding binary decides
//! whether an exporter is installed. Without one these calls are no-ops.
//!
//! - `llm_attempts_total` (counter): labels `mode`, `outcome`
//! - `llm_failures_total` (counter): label `class`
//! - `llm_generate_duration_seconds` (histogram): labels `mode`, `result`

use crate::error::{Error, FailureClass};

/// Record one attempt. `outcome` is "success" or a failure class label.
pub fn record_attempt(mode: &'static str, outcome: &'static str) {
    metrics::counter!("llm_attempts_total", "mode" => mode, "outcome" => outcome).increment(1);
}

pub fn record_failure(class: FailureClass) {
    metrics::counter!("llm_failures_total", "class" => class.label()).increment(1);
}

/// Record a finished generate call with its terminal result.
pub fn record_generate(mode: &'static str, result: Result<(), &Error>, duration_secs: f64) {
    let result = match result {
        Ok(()) => "success",
        Err(err) => err.kind(),
    };
    metrics::histogram!("llm_generate_duration_seconds", "mode" => mode, "result" => result)
        .record(duration_secs);
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
        record_attempt("request", "success");
        record_failure(FailureClass::Timeout);
        record_generate("stream", Ok(()), 0.2);
    }

    #[test]
    fn attempts_and_failures_carry_labels() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_attempt("request", "rate_limited");
        record_attempt("request", "success");
        record_failure(FailureClass::RateLimited);

        let output = handle.render();
        assert!(output.contains("llm_attempts_total"), "got: {output}");
        assert!(output.contains("outcome=\"rate_limited\""), "got: {output}");
        assert!(output.contains("outcome=\"success\""), "got: {output}");
        assert!(output.contains("llm_failures_total{class=\"rate_limited\"} 1"), "got: {output}");
    }

    #[test]
    fn generate_duration_is_labelled_by_result() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_generate("request", Err(&Error::AllDailyQuotaExhausted), 1.5);

        let output = handle.render();
        assert!(output.contains("llm_generate_duration_seconds"), "got: {output}");
        assert!(
            output.contains("result=\"all_daily_quota_exhausted\""),
            "got: {output}"
        );
    }
}
