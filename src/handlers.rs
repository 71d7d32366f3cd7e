use crate::{
    auth::{CurrentUser, Session},
    models::{HrefResponse, NavigationResponse, RouteSummary},
    navigation::NavigatorState,
    pattern::Params,
    route_table::TableError,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// --- Query Structs ---

/// NavigateQuery
///
/// Query parameters for GET /api/navigate.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NavigateQuery {
    /// The path the shell is about to navigate to, optionally with a query string.
    pub path: String,
}

// --- Handlers ---

/// health
///
/// [Public Route] Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// list_routes
///
/// [Public Route] The route table in declaration order.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route table", body = [RouteSummary]))
)]
pub async fn list_routes(State(navigator): State<NavigatorState>) -> Json<Vec<RouteSummary>> {
    Json(navigator.table().iter().map(RouteSummary::from).collect())
}

/// route_href
///
/// [Public Route] Reverse URL generation. Route parameters are passed as query
/// parameters, e.g. `/api/routes/branches/href?company_id=42`.
#[utoipa::path(
    get,
    path = "/api/routes/{name}/href",
    params(("name" = String, Path, description = "Route name")),
    responses(
        (status = 200, description = "Concrete URL", body = HrefResponse),
        (status = 404, description = "Unknown route"),
        (status = 422, description = "Missing route parameter")
    )
)]
pub async fn route_href(
    State(navigator): State<NavigatorState>,
    Path(name): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<HrefResponse>, StatusCode> {
    match navigator.table().href(&name, &params) {
        Ok(href) => Ok(Json(HrefResponse { href })),
        Err(TableError::UnknownRoute(_)) => Err(StatusCode::NOT_FOUND),
        Err(TableError::MissingParam { .. }) => Err(StatusCode::UNPROCESSABLE_ENTITY),
        Err(e) => {
            tracing::error!(error = %e, "unexpected href failure");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// navigate
///
/// [Public Route] Resolves a path against the route table and runs the
/// navigation guard for the caller's session. Anonymous callers are valid:
/// the guard answers with a redirect instead of an error.
///
/// *Note*: the only error is 404 for tables that declare no catch-all route.
#[utoipa::path(
    get,
    path = "/api/navigate",
    params(NavigateQuery),
    responses(
        (status = 200, description = "Guard decision", body = NavigationResponse),
        (status = 400, description = "Missing path"),
        (status = 404, description = "No route matches and the table has no fallback")
    )
)]
pub async fn navigate(
    session: Session,
    State(navigator): State<NavigatorState>,
    Query(query): Query<NavigateQuery>,
) -> Result<Json<NavigationResponse>, StatusCode> {
    let navigation = navigator
        .navigate(&query.path, &session)
        .map_err(|e| match e {
            TableError::NoMatch(_) => StatusCode::NOT_FOUND,
            other => {
                tracing::error!(error = %other, "navigation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;
    Ok(Json(NavigationResponse::from(navigation)))
}

/// get_session
///
/// [Authenticated Route] The identity behind the caller's session, as attached
/// by `auth_middleware`.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(Extension(user): Extension<CurrentUser>) -> Json<CurrentUser> {
    Json(user)
}
