use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use influx_request_metrics::{
    config::{self, Config},
    metrics::{build_writer, DiscardWriter, MetricsWriter},
    server, AppState, RequestTimingRecorder,
};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // ── 1. Load config ───────────────────────────────────────────
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("REQUEST_METRICS_CONFIG").ok());
    let cfg = match path.as_deref() {
        Some(path) => config::load_from_file(path).unwrap_or_else(|e| {
            tracing::error!(%path, error = %e, "config load failed");
            std::process::exit(1);
        }),
        None => Config::default(),
    };

    // ── 2. Metrics writer (never blocks serving) ─────────────────
    let writer: Arc<dyn MetricsWriter> = match build_writer(&cfg.writer).await {
        Ok(writer) => writer,
        Err(e) => {
            tracing::warn!(error = %e, "metrics writer unavailable; request metrics disabled");
            Arc::new(DiscardWriter)
        }
    };
    let recorder = RequestTimingRecorder::new(&cfg.recorder, writer);

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(Arc::new(AppState::new()), recorder);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(cfg.listen.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(listen = %cfg.listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        listen = %cfg.listen,
        measurement = %cfg.recorder.measurement,
        host = %cfg.recorder.host,
        "influx-request-metrics demo starting"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
