use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that only make sense with a session. The whole router is wrapped in
/// `auth_middleware`, which attaches the resolved `CurrentUser` as a request
/// extension for the handlers here.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/session
        // The current user's id, role and module permissions, used by the shell
        // to build its menu.
        .route("/api/session", get(handlers::get_session))
}
