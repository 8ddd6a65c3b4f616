//! Request timing for axum services, reported as InfluxDB points.
//!
//! Two hooks cooperate per request. [`middleware::record_request`] wraps the
//! whole router and records on the way out; a [`middleware::ViewRoute`]
//! route layer starts the clock once routing has picked a handler. Each
//! timed request yields one [`metrics::MetricPoint`], handed to a
//! [`metrics::MetricsWriter`] whose failures never reach the response.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod recorder;
pub mod redis_client;
pub mod server;

use std::collections::BTreeMap;

use parking_lot::RwLock;

pub use error::{MetricsError, Result};
pub use recorder::{HandlerRef, RequestTimingRecorder, RequestUser};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// In-memory article store backing the demo routes.
    pub articles: RwLock<BTreeMap<u64, handlers::articles::Article>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(handlers::articles::seed()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
