use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Database Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Recommender Metrics
    pub static ref RECOMMENDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "recommendations_total",
        "Total number of recommendation requests by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref RECOMMENDATION_DURATION_SECONDS: Histogram = register_histogram!(
        "recommendation_duration_seconds",
        "Time to load a student snapshot and rank the catalog",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .unwrap();

    pub static ref RECOMMENDATION_CONFIDENCE: Histogram = register_histogram!(
        "recommendation_confidence",
        "Confidence of the top recommended lesson",
        vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95]
    )
    .unwrap();

    // Business Metrics
    pub static ref ATTEMPTS_RECORDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempts_recorded_total",
        "Total number of recorded attempts",
        &["kind", "correct"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track database operation with metrics
pub async fn track_db_operation<F, T, E>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(duration);

    result
}

pub fn record_attempt(kind: &str, correct: bool) {
    let correct = if correct { "true" } else { "false" };
    ATTEMPTS_RECORDED_TOTAL
        .with_label_values(&[kind, correct])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = RECOMMENDATIONS_TOTAL.with_label_values(&["ok"]).get();
    }

    #[test]
    fn test_render_metrics() {
        record_attempt("lesson", true);

        let output = render_metrics().unwrap();
        assert!(output.contains("attempts_recorded_total"));
    }

    #[tokio::test]
    async fn test_track_db_operation_passes_result_through() {
        let ok: Result<u32, String> = track_db_operation("find", "lessons", async { Ok(3) }).await;
        assert_eq!(ok, Ok(3));

        let err: Result<u32, String> =
            track_db_operation("find", "lessons", async { Err("boom".to_string()) }).await;
        assert!(err.is_err());
        assert!(
            DB_OPERATIONS_TOTAL
                .with_label_values(&["find", "lessons", "error"])
                .get()
                >= 1
        );
    }
}
