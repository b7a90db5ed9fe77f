use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // Question Metrics
    pub static ref QUESTIONS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "questions_generated_total",
        "Total number of quiz questions generated",
        &["mode"]
    )
    .unwrap();

    pub static ref QUESTION_GENERATION_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "question_generation_failures_total",
        "Number of times a placeholder question replaced a failed generation"
    )
    .unwrap();

    // Answer Metrics
    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_submitted_total",
        "Total number of answers submitted",
        &["mode", "outcome"]
    )
    .unwrap();

    pub static ref ANSWER_TIME_SECONDS: Histogram = register_histogram!(
        "answer_time_seconds",
        "Time taken to answer a question",
        vec![0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]
    )
    .unwrap();

    // Session Metrics
    pub static ref QUIZ_SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_sessions_total",
        "Total number of quiz sessions by lifecycle event",
        &["status"]
    )
    .unwrap();

    pub static ref QUIZ_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "quiz_sessions_active",
        "Number of quiz sessions currently in progress"
    )
    .unwrap();

    pub static ref FINAL_SCORE: Histogram = register_histogram!(
        "final_score",
        "Final score of completed sessions",
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&["NORMAL", "correct"])
            .get();
        let _ = QUIZ_SESSIONS_ACTIVE.get();
    }

    #[test]
    fn test_render_metrics() {
        QUESTIONS_GENERATED_TOTAL
            .with_label_values(&["SHADE"])
            .inc();

        let result = render_metrics();
        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.contains("questions_generated_total"));
    }
}
