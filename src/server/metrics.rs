use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all service metrics
const PREFIX: &str = "album_ingest";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 60.0]),
        &["method", "endpoint"]
    ).expect("Failed to create http_request_duration_seconds metric");

    pub static ref HTTP_RESPONSE_BYTES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_http_response_bytes_total"), "Response bytes sent"),
        &["endpoint"]
    ).expect("Failed to create http_response_bytes_total metric");

    // Ingestion runs
    pub static ref INGESTION_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_ingestion_runs_total"), "Pipeline runs by trigger and outcome"),
        &["trigger", "status"]
    ).expect("Failed to create ingestion_runs_total metric");

    pub static ref INGESTION_RUN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_ingestion_run_duration_seconds"),
            "Pipeline run duration in seconds"
        )
        .buckets(vec![0.1, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0])
    ).expect("Failed to create ingestion_run_duration_seconds metric");

    pub static ref INGESTION_ALBUMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_ingestion_albums_total"), "Albums processed by outcome"),
        &["outcome"]
    ).expect("Failed to create ingestion_albums_total metric");

    pub static ref INGESTION_ARTISTS_CREATED_TOTAL: IntCounter = IntCounter::new(
        format!("{PREFIX}_ingestion_artists_created_total"),
        "Artist entries created"
    ).expect("Failed to create ingestion_artists_created_total metric");

    // Sources
    pub static ref SOURCE_FETCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_source_fetches_total"), "Album source fetches by outcome"),
        &["source", "status"]
    ).expect("Failed to create source_fetches_total metric");

    pub static ref SOURCE_ALBUMS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_source_albums_total"), "Candidate albums returned per source"),
        &["source"]
    ).expect("Failed to create source_albums_total metric");

    // Background jobs
    pub static ref BACKGROUND_JOB_EXECUTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(format!("{PREFIX}_background_job_executions_total"), "Background job executions"),
        &["job_id", "status"]
    ).expect("Failed to create background_job_executions_total metric");

    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_background_job_duration_seconds"),
            "Background job duration in seconds"
        )
        .buckets(vec![0.1, 1.0, 10.0, 60.0, 300.0, 900.0]),
        &["job_id"]
    ).expect("Failed to create background_job_duration_seconds metric");

    pub static ref BACKGROUND_JOB_RUNNING: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_background_job_running"), "1 while a job is running"),
        &["job_id"]
    ).expect("Failed to create background_job_running metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Resident memory of the process in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_RESPONSE_BYTES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(INGESTION_RUNS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(INGESTION_RUN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(INGESTION_ALBUMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(INGESTION_ARTISTS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SOURCE_FETCHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SOURCE_ALBUMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_EXECUTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BACKGROUND_JOB_RUNNING.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Bucket a request path into a low-cardinality label.
pub fn categorize_endpoint(path: &str) -> &'static str {
    if path.starts_with("/services/albums") {
        "ingestion"
    } else if path.starts_with("/v1/content") {
        "content"
    } else if path.starts_with("/v1/jobs") {
        "jobs"
    } else if path == "/" {
        "home"
    } else {
        "other"
    }
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

pub fn record_bandwidth(endpoint: &str, bytes: u64) {
    HTTP_RESPONSE_BYTES_TOTAL
        .with_label_values(&[endpoint])
        .inc_by(bytes);
}

pub fn record_ingestion_run(trigger: &str, status: &str, duration: Duration) {
    INGESTION_RUNS_TOTAL
        .with_label_values(&[trigger, status])
        .inc();
    INGESTION_RUN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// `outcome` is one of `created`, `updated`, `skipped`.
pub fn record_album_outcome(outcome: &str) {
    INGESTION_ALBUMS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_artist_created() {
    INGESTION_ARTISTS_CREATED_TOTAL.inc();
}

pub fn record_source_fetch(source: &str, status: &str, albums: usize) {
    SOURCE_FETCHES_TOTAL
        .with_label_values(&[source, status])
        .inc();
    SOURCE_ALBUMS_TOTAL
        .with_label_values(&[source])
        .inc_by(albums as u64);
}

pub fn record_background_job_execution(job_id: &str, status: &str, duration: Duration) {
    BACKGROUND_JOB_EXECUTIONS_TOTAL
        .with_label_values(&[job_id, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_id])
        .observe(duration.as_secs_f64());
}

pub fn set_background_job_running(job_id: &str, running: bool) {
    BACKGROUND_JOB_RUNNING
        .with_label_values(&[job_id])
        .set(if running { 1.0 } else { 0.0 });
}

pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
