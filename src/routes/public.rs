use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints open to any caller. The navigate endpoint still reads the
/// session when one is presented; it just never rejects for lack of one.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(handlers::health))
        // GET /api/routes
        // The route table in declaration order.
        .route("/api/routes", get(handlers::list_routes))
        // GET /api/routes/{name}/href?param=value
        // Reverse URL generation for named routes.
        .route("/api/routes/{name}/href", get(handlers::route_href))
        // GET /api/navigate?path=/usuarios
        // Match + guard decision for the caller's session.
        .route("/api/navigate", get(handlers::navigate))
}
