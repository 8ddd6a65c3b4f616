use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, Method, Uri};
use parking_lot::Mutex;

/// The user the application's auth layer resolved for this request.
///
/// Inserted into request extensions by the auth layer. A request without
/// one is treated as anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestUser {
    pub authenticated: bool,
    pub staff: bool,
    pub superuser: bool,
}

impl RequestUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn member() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn staff() -> Self {
        Self {
            authenticated: true,
            staff: true,
            ..Self::default()
        }
    }

    pub fn superuser() -> Self {
        Self {
            authenticated: true,
            staff: true,
            superuser: true,
        }
    }
}

/// Result of route resolution for the dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverMatch {
    pub view_name: String,
}

/// Everything captured at dispatch that the metric point is built from.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub start_time: Instant,
    pub view_module: String,
    pub view_name: String,
    pub method: Method,
    /// Path plus query string.
    pub full_path: String,
    pub is_ajax: bool,
    pub user: RequestUser,
    pub resolver_match: ResolverMatch,
}

/// Per-request hand-off between the dispatch hook and the recording hook.
///
/// The recording middleware puts an empty slot into the request extensions
/// before routing; the dispatch hook fills it once the handler is known.
/// An empty slot at the end of the request means dispatch never ran.
#[derive(Debug, Clone, Default)]
pub struct TimingSlot(Arc<Mutex<Option<RequestContext>>>);

impl TimingSlot {
    pub fn attach(&self, ctx: RequestContext) {
        *self.0.lock() = Some(ctx);
    }

    pub fn take(&self) -> Option<RequestContext> {
        self.0.lock().take()
    }
}

/// `X-Requested-With: XMLHttpRequest`, the header XHR libraries send.
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

pub fn full_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| "/".to_owned())
}
