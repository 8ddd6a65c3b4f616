use axum::{middleware as axum_mw, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::handlers::articles::{self, ArticleDetailView};
use crate::middleware::{auth, timing};
use crate::recorder::RequestTimingRecorder;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and the timing hooks.
pub fn create_router(state: Arc<AppState>, recorder: RequestTimingRecorder) -> Router {
    Router::new()
        // ── Article endpoints ───────────────────────────────────
        .route(
            "/api/articles",
            recorder
                .named("articles-list")
                .get(articles::list_articles)
                .merge(recorder.named("articles-list").post(articles::create_article)),
        )
        .route(
            "/api/articles/:id",
            recorder.named("articles-detail").get_view(ArticleDetailView),
        )
        .route(
            "/api/articles/:id/preview",
            recorder.route().get(articles::preview_article),
        )
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Unrouted requests never reach dispatch ──────────────
        .fallback(|| async { crate::handlers::AppError::NotFound("no such route".into()) })
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(auth::demo_user))
        .layer(axum_mw::from_fn_with_state(recorder, timing::record_request))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
}
