use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;

use super::http_writer::HttpWriter;
use super::queue_writer::QueueWriter;
use super::MetricPoint;
use crate::config::WriterConfig;
use crate::error::Result;

/// The metrics backend, seen from the request path: hand it points, it may fail.
///
/// Batching, connections, retries and the wire format all live behind this
/// trait. The recorder only ever submits one point at a time.
#[async_trait]
pub trait MetricsWriter: Send + Sync {
    async fn submit(&self, points: &[MetricPoint]) -> Result<()>;
}

/// Accepts everything and keeps nothing. Used when metrics are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardWriter;

#[async_trait]
impl MetricsWriter for DiscardWriter {
    async fn submit(&self, _points: &[MetricPoint]) -> Result<()> {
        Ok(())
    }
}

/// Submit `points`, dropping them on any failure.
///
/// Both an `Err` from the writer and a panic inside it end here. Nothing is
/// retried and nothing reaches the caller.
pub async fn submit_best_effort(writer: &dyn MetricsWriter, points: &[MetricPoint]) {
    match AssertUnwindSafe(writer.submit(points)).catch_unwind().await {
        Ok(Ok(())) => {
            tracing::trace!(count = points.len(), "metric points submitted");
        }
        Ok(Err(err)) => {
            tracing::debug!(error = %err, count = points.len(), "dropping metric points");
        }
        Err(_) => {
            tracing::debug!(count = points.len(), "metrics writer panicked; dropping points");
        }
    }
}

/// Build the configured writer. Connection setup happens here, once.
pub async fn build_writer(cfg: &WriterConfig) -> Result<Arc<dyn MetricsWriter>> {
    let writer: Arc<dyn MetricsWriter> = match cfg {
        WriterConfig::Http {
            url,
            database,
            username,
            password,
            timeout_ms,
        } => Arc::new(HttpWriter::new(
            url,
            database,
            username
                .clone()
                .map(|user| (user, password.clone().unwrap_or_default())),
            std::time::Duration::from_millis(*timeout_ms),
        )?),
        WriterConfig::Queue { url, key } => Arc::new(QueueWriter::connect(url, key).await?),
        WriterConfig::Disabled => Arc::new(DiscardWriter),
    };
    Ok(writer)
}
