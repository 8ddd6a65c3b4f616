use std::panic::AssertUnwindSafe;

use axum::{
    extract::{Request, State},
    handler::Handler,
    middleware::{self as axum_mw, Next},
    response::Response,
    routing::{self, MethodFilter, MethodRouter},
};
use futures_util::FutureExt;

use crate::recorder::{HandlerRef, RequestTimingRecorder, TimingSlot};

/// Router-wide recording hook.
///
/// Gives every request an empty [`TimingSlot`], runs the rest of the stack
/// and records on the way out: after a response, or after the inner stack
/// panicked. A panic is resumed untouched once recorded, so whatever sits
/// outside (usually `CatchPanicLayer`) sees the original payload.
pub async fn record_request(
    State(recorder): State<RequestTimingRecorder>,
    mut req: Request,
    next: Next,
) -> Response {
    let slot = TimingSlot::default();
    req.extensions_mut().insert(slot.clone());

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => recorder.on_response(&slot, response).await,
        Err(panic) => {
            recorder.on_exception(&slot).await;
            std::panic::resume_unwind(panic)
        }
    }
}

/// Builds timed method routers for one route.
///
/// Every constructor takes the handler that axum will dispatch to and
/// derives the reported identity from that same value, so the two cannot
/// disagree.
#[derive(Clone)]
pub struct ViewRoute {
    recorder: RequestTimingRecorder,
    name: Option<&'static str>,
}

impl RequestTimingRecorder {
    /// A route whose `view_name` falls back to the matched path.
    pub fn route(&self) -> ViewRoute {
        ViewRoute {
            recorder: self.clone(),
            name: None,
        }
    }

    /// A route with a canonical name.
    pub fn named(&self, name: &'static str) -> ViewRoute {
        ViewRoute {
            recorder: self.clone(),
            name: Some(name),
        }
    }
}

impl ViewRoute {
    pub fn get<H, T, S>(&self, handler: H) -> MethodRouter<S>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        self.on(MethodFilter::GET, handler)
    }

    pub fn post<H, T, S>(&self, handler: H) -> MethodRouter<S>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        self.on(MethodFilter::POST, handler)
    }

    /// Route a function handler, identified by the function itself.
    pub fn on<H, T, S>(&self, filter: MethodFilter, handler: H) -> MethodRouter<S>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        self.dispatching(HandlerRef::function(&handler), routing::on(filter, handler))
    }

    /// Route an object handler, identified by its type.
    pub fn on_view<V, T, S>(&self, filter: MethodFilter, view: V) -> MethodRouter<S>
    where
        V: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        self.dispatching(HandlerRef::object(&view), routing::on(filter, view))
    }

    pub fn get_view<V, T, S>(&self, view: V) -> MethodRouter<S>
    where
        V: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        self.on_view(MethodFilter::GET, view)
    }

    fn dispatching<S>(&self, handler: HandlerRef, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let dispatch = Dispatch {
            recorder: self.recorder.clone(),
            handler,
            name: self.name,
        };
        route.route_layer(axum_mw::from_fn_with_state(dispatch, dispatch_view))
    }
}

#[derive(Clone)]
struct Dispatch {
    recorder: RequestTimingRecorder,
    handler: HandlerRef,
    name: Option<&'static str>,
}

async fn dispatch_view(State(dispatch): State<Dispatch>, req: Request, next: Next) -> Response {
    dispatch
        .recorder
        .on_dispatch(&req, &dispatch.handler, dispatch.name);
    next.run(req).await
}
