pub mod context;
pub mod handler;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::MatchedPath;
use axum::http::Request;
use chrono::Utc;

pub use context::{RequestContext, RequestUser, ResolverMatch, TimingSlot};
pub use handler::{HandlerIdentity, HandlerRef};

use crate::config::{RecorderConfig, SubmitMode};
use crate::metrics::{submit_best_effort, FieldValue, MetricPoint, MetricsWriter, TagValue};

/// Times requests between dispatch and completion and emits one
/// [`MetricPoint`] per timed request.
///
/// Holds only immutable settings and the writer; all per-request data
/// travels in the request's [`TimingSlot`]. Cheap to clone.
#[derive(Clone)]
pub struct RequestTimingRecorder {
    inner: Arc<Inner>,
}

struct Inner {
    measurement: String,
    host: String,
    submit: SubmitMode,
    writer: Arc<dyn MetricsWriter>,
}

/// Flags derived from the resolved user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFlags {
    pub is_authenticated: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserFlags {
    /// Privilege fields are only consulted for an authenticated user.
    pub fn from_user(user: &RequestUser) -> Self {
        if !user.authenticated {
            return Self::default();
        }
        Self {
            is_authenticated: true,
            is_staff: user.staff,
            is_superuser: user.superuser,
        }
    }
}

impl RequestTimingRecorder {
    pub fn new(cfg: &RecorderConfig, writer: Arc<dyn MetricsWriter>) -> Self {
        Self {
            inner: Arc::new(Inner {
                measurement: cfg.measurement.clone(),
                host: cfg.host.clone(),
                submit: cfg.submit,
                writer,
            }),
        }
    }

    // ─── Hooks ───────────────────────────────────────────────────

    /// Start timing `req`, about to be handled by `handler`.
    ///
    /// Does nothing when the handler has no resolvable identity or the
    /// request carries no [`TimingSlot`].
    pub fn on_dispatch<B>(&self, req: &Request<B>, handler: &HandlerRef, route_name: Option<&str>) {
        let Some(slot) = req.extensions().get::<TimingSlot>() else {
            tracing::trace!("no timing slot on request; recording layer not installed");
            return;
        };
        let Some(identity) = handler.identity() else {
            tracing::debug!(?handler, "handler has no resolvable identity; not timing request");
            return;
        };

        let view_name = route_name
            .map(str::to_owned)
            .or_else(|| req.extensions().get::<MatchedPath>().map(|p| p.as_str().to_owned()))
            .unwrap_or_else(|| identity.dotted());

        slot.attach(RequestContext {
            start_time: Instant::now(),
            view_module: identity.module,
            view_name: identity.name,
            method: req.method().clone(),
            full_path: context::full_path(req.uri()),
            is_ajax: context::is_ajax(req.headers()),
            user: req.extensions().get::<RequestUser>().copied().unwrap_or_default(),
            resolver_match: ResolverMatch { view_name },
        });
    }

    /// Record the finished request and pass `response` through untouched.
    pub async fn on_response<T>(&self, slot: &TimingSlot, response: T) -> T {
        self.record(slot.take()).await;
        response
    }

    /// Record a request whose handler failed. The caller keeps propagating
    /// the failure afterwards.
    pub async fn on_exception(&self, slot: &TimingSlot) {
        self.record(slot.take()).await;
    }

    // ─── Recording ───────────────────────────────────────────────

    async fn record(&self, ctx: Option<RequestContext>) {
        let Some(ctx) = ctx else {
            tracing::trace!("request was never dispatched; no metric");
            return;
        };
        let point = self.build_point(&ctx, Instant::now());

        match self.inner.submit {
            SubmitMode::Inline => submit_best_effort(self.inner.writer.as_ref(), &[point]).await,
            SubmitMode::Background => {
                let writer = Arc::clone(&self.inner.writer);
                tokio::spawn(async move {
                    submit_best_effort(writer.as_ref(), &[point]).await;
                });
            }
        }
    }

    /// Assemble the point for a request that finished at `finished_at`.
    pub fn build_point(&self, ctx: &RequestContext, finished_at: Instant) -> MetricPoint {
        let flags = UserFlags::from_user(&ctx.user);

        let mut tags = BTreeMap::new();
        tags.insert("host".to_owned(), TagValue::from(self.inner.host.as_str()));
        tags.insert("is_ajax".to_owned(), TagValue::from(ctx.is_ajax));
        tags.insert("is_authenticated".to_owned(), TagValue::from(flags.is_authenticated));
        tags.insert("is_staff".to_owned(), TagValue::from(flags.is_staff));
        tags.insert("is_superuser".to_owned(), TagValue::from(flags.is_superuser));
        tags.insert("method".to_owned(), TagValue::from(ctx.method.as_str()));
        tags.insert("module".to_owned(), TagValue::from(ctx.view_module.as_str()));
        tags.insert("view".to_owned(), TagValue::from(ctx.view_name.as_str()));
        tags.insert(
            "view_name".to_owned(),
            TagValue::from(ctx.resolver_match.view_name.as_str()),
        );

        let mut fields = BTreeMap::new();
        fields.insert(
            "value".to_owned(),
            FieldValue::from(elapsed_millis(ctx.start_time, finished_at)),
        );
        fields.insert("url".to_owned(), FieldValue::from(ctx.full_path.clone()));

        MetricPoint {
            measurement: self.inner.measurement.clone(),
            tags,
            fields,
            time: Utc::now(),
        }
    }
}

/// Whole milliseconds between the two instants, truncated toward zero.
pub fn elapsed_millis(start: Instant, end: Instant) -> i64 {
    let ms = end.saturating_duration_since(start).as_millis();
    i64::try_from(ms).unwrap_or(i64::MAX)
}
