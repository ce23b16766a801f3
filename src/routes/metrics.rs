use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

/// Install the global Prometheus recorder and describe the generation metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    ::metrics::describe_counter!(
        "generation_requests_total",
        "Generation requests received"
    );
    ::metrics::describe_counter!(
        "generation_completed_total",
        "Generation requests that returned a finished video"
    );
    ::metrics::describe_counter!(
        "generation_failed_total",
        "Generation requests that failed, by error code"
    );
    ::metrics::describe_histogram!(
        "generation_upload_seconds",
        "Time to upload the image and audio pair"
    );
    ::metrics::describe_histogram!(
        "generation_poll_seconds",
        "Time spent polling a job to its final state"
    );
    ::metrics::describe_histogram!(
        "generation_poll_attempts",
        "Status checks made per polled job"
    );

    Ok(handle)
}

/// Attach `GET /metrics` to an application router.
pub fn with_scrape_route(app: Router, handle: PrometheusHandle) -> Router {
    app.route(
        "/metrics",
        get(prometheus_metrics).with_state(Arc::new(handle)),
    )
}

/// Prometheus text exposition of everything recorded so far.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
