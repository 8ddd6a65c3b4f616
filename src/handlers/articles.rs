//! Demo blog endpoints: one plain function handler, one object handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    handler::Handler,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AppError;
use crate::AppState;

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

// ─── GET /api/articles ───────────────────────────────────────────

pub async fn list_articles(State(state): State<Arc<AppState>>) -> Json<Vec<Article>> {
    Json(state.articles.read().values().cloned().collect())
}

// ─── POST /api/articles ──────────────────────────────────────────

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateArticleRequest>,
) -> Result<Json<Article>, AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let mut articles = state.articles.write();
    let id = articles.keys().next_back().map_or(1, |last| last + 1);
    let article = Article {
        id,
        title: req.title,
        body: req.body,
        published_at: Utc::now(),
    };
    articles.insert(id, article.clone());
    Ok(Json(article))
}

// ─── GET /api/articles/:id ───────────────────────────────────────

/// Object-style handler: axum dispatches to the view value itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleDetailView;

impl ArticleDetailView {
    pub async fn get(self, state: Arc<AppState>, id: u64) -> Result<Json<Article>, AppError> {
        state
            .articles
            .read()
            .get(&id)
            .cloned()
            .map(Json)
            .ok_or_else(|| AppError::NotFound(format!("article {id} not found")))
    }
}

impl Handler<ArticleDetailView, Arc<AppState>> for ArticleDetailView {
    type Future = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

    fn call(self, req: Request, state: Arc<AppState>) -> Self::Future {
        Box::pin(async move {
            let (mut parts, _body) = req.into_parts();
            let id = match Path::<u64>::from_request_parts(&mut parts, &state).await {
                Ok(Path(id)) => id,
                Err(rejection) => return rejection.into_response(),
            };
            self.get(state, id).await.into_response()
        })
    }
}

// ─── GET /api/articles/:id/preview ───────────────────────────────

/// Preview rendering is not wired up; the handler fails hard so the
/// exception path has something to exercise.
pub async fn preview_article(Path(id): Path<u64>) -> Json<Article> {
    panic!("preview renderer missing for article {id}");
}

/// A couple of articles so the demo has something to serve.
pub fn seed() -> std::collections::BTreeMap<u64, Article> {
    [
        (1, "Hello, world", "First post."),
        (2, "Timing requests", "Every request ends up as a point."),
    ]
    .into_iter()
    .map(|(id, title, body)| {
        (
            id,
            Article {
                id,
                title: title.into(),
                body: body.into(),
                published_at: Utc::now(),
            },
        )
    })
    .collect()
}
