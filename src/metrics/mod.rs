use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::register_int_counter_vec;
use prometheus::IntCounterVec;
use tokio::sync::watch;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

lazy_static! {
    pub static ref VOTE_RESULTS_METRIC: IntCounterVec = register_int_counter_vec!(
        "vote_results_total",
        "Vote increments by strategy and outcome",
        &["strategy", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref RECONCILED_VOTES_METRIC: IntCounterVec = register_int_counter_vec!(
        "reconciled_votes_total",
        "Vote deltas folded into the durable store, and failed folds",
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref TICKET_ROTATIONS_METRIC: IntCounterVec = register_int_counter_vec!(
        "ticket_rotations_total",
        "Admission ticket rotations by outcome",
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref CACHE_READS_METRIC: IntCounterVec = register_int_counter_vec!(
        "cache_reads_total",
        "Read-path cache lookups by result",
        &["result"]
    )
    .expect("metric can not be created");
}

pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    prometheus_exporter::init();

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    info!("metrics server listening on :{}/metrics", port);
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        eprintln!("could not encode prometheus metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    res.push_str(&get_metrics_body());
    Ok(res)
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    let autometrics_response = prometheus_exporter::encode_http_response();
    autometrics_response.into_body()
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics() -> PrometheusResponse {
    prometheus_exporter::encode_http_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_metrics_should_register_once() {
        VOTE_RESULTS_METRIC
            .with_label_values(&["cached", "success"])
            .inc();
        CACHE_READS_METRIC.with_label_values(&["hit"]).inc();

        assert!(VOTE_RESULTS_METRIC
            .with_label_values(&["cached", "success"])
            .get()
            >= 1);
    }
}
