use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Navigation core: patterns, the route table, the two deployments, the guard.
pub mod pattern;
pub mod route_table;
pub mod tables;
pub mod guard;
pub mod navigation;

// Session resolution and the external authentication provider.
pub mod auth;
pub mod provider;

// Service surface.
pub mod config;
pub mod handlers;
pub mod models;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};
use auth::AuthUser;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{Decision, GuardPolicy, NavigationGuard};
pub use navigation::{Navigator, NavigatorState};
pub use provider::{AuthProvider, AuthState, JwtAuthProvider, MemoryAuthProvider};
pub use route_table::{RouteTable, TableError};

/// ApiDoc
///
/// OpenAPI document for the navigation service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::list_routes, handlers::route_href,
        handlers::navigate, handlers::get_session
    ),
    components(
        schemas(
            models::RouteSummary, models::HrefResponse, models::NavigationResponse,
            models::DecisionKind, route_table::Middleware, route_table::ViewModule,
            auth::CurrentUser,
        )
    ),
    tags(
        (name = "solmetec-nav", description = "Route table and navigation guard")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, immutable container shared by every request: the navigator (route
/// table + guard), the authentication provider, and the configuration.
#[derive(Clone)]
pub struct AppState {
    pub navigator: NavigatorState,
    pub auth: AuthState,
    pub config: AppConfig,
}

impl AppState {
    /// build
    ///
    /// Loads the configured route table and binds it to a guard following the
    /// configured policy. Any table error here is startup-fatal for the caller.
    pub fn build(config: AppConfig, auth: AuthState) -> Result<Self, TableError> {
        let table = Arc::new(config.load_route_table()?);
        let policy = GuardPolicy {
            redirect_authenticated_guests: config.redirect_authenticated_guests,
            ..GuardPolicy::default()
        };
        let navigator = Navigator::new(table, policy, config.app_name.clone())?;

        Ok(Self {
            navigator: Arc::new(navigator),
            auth,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for NavigatorState {
    fn from_ref(app_state: &AppState) -> NavigatorState {
        app_state.navigator.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces a session for the `authenticated_routes`. `AuthUser` rejects with
/// 401 before `next` runs when the request carries no valid credential;
/// otherwise the resolved `CurrentUser` is stored in the request extensions
/// for the handlers behind it.
async fn auth_middleware(
    AuthUser(user): AuthUser,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, applies scoped and global middleware, and registers
/// the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware
                ))
        )
        .with_state(state);

    // Observability and correlation layers, outermost first.
    base_router
        .layer(
             ServiceBuilder::new()
                 .layer(SetRequestIdLayer::new(
                     x_request_id.clone(),
                     MakeRequestUuid,
                 ))
                 .layer(
                     TraceLayer::new_for_http()
                         .make_span_with(trace_span_logger)
                         .on_response(
                             DefaultOnResponse::new()
                                 .level(Level::INFO)
                                 .latency_unit(tower_http::LatencyUnit::Millis)
                         )
                 )
                 .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: tags every log line of a request with its
/// method, URI and `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
