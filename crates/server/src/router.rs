//! Route table and layer stack.

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{handlers, middleware, AppState};

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the full application router.
///
/// `/health` and `/metrics` sit outside the concurrency limit so probes keep answering under
/// load. Every response carries an `x-request-id`.
pub fn create_router(state: AppState) -> Router {
    let max_concurrent = state.config.server.max_concurrent_requests;

    let (set_request_id, propagate_request_id) = middleware::create_request_id_layers();
    let (set_request_id_public, propagate_request_id_public) =
        middleware::create_request_id_layers();

    let public = Router::new()
        .route("/health", get(handlers::system::health))
        .route("/metrics", get(handlers::system::metrics))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            middleware::make_request_span(request)
        }))
        .layer(propagate_request_id_public)
        .layer(set_request_id_public);

    let api = Router::new()
        .route("/pending-queue", get(handlers::pending::pop_pending))
        .route("/pending-queue/status", get(handlers::pending::pending_status))
        .route("/tx/{hash}", get(handlers::chain::get_transaction))
        .route("/balance/{address}", get(handlers::chain::get_balance))
        .route("/transactions/recent", get(handlers::transactions::recent))
        .route("/transactions/address/{address}", get(handlers::transactions::by_address))
        .route("/transactions/stats", get(handlers::transactions::stats))
        .route("/query", post(handlers::query::execute))
        .route("/nl-to-sql", post(handlers::nl2sql::translate))
        .route("/auth/connect", post(handlers::auth::connect))
        .route("/auth/disconnect", post(handlers::auth::disconnect))
        .route("/auth/status/{user_id}", get(handlers::auth::status))
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            middleware::make_request_span(request)
        }))
        // Layers run in reverse order, so propagate sees the id set below it.
        .layer(propagate_request_id)
        .layer(set_request_id);

    public.merge(api)
}
