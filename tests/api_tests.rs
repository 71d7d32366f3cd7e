use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use solmetec_nav::{
    AppConfig, AppState, AuthProvider, MemoryAuthProvider, create_router,
    auth::CurrentUser,
    config::TableVariant,
    provider::AuthState,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::net::TcpListener;
use uuid::Uuid;

const OPERATOR_TOKEN: &str = "operator-token";
const ADMIN_TOKEN: &str = "admin-token";

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

fn provider() -> AuthState {
    let operator = Uuid::from_u128(10);
    let admin = Uuid::from_u128(11);
    Arc::new(
        MemoryAuthProvider::new()
            .with_user(CurrentUser {
                id: operator,
                role: "operator".to_string(),
                permissions: vec!["users".to_string()],
            })
            .with_user(CurrentUser {
                id: admin,
                role: "admin".to_string(),
                permissions: vec![],
            })
            .with_token(OPERATOR_TOKEN, operator)
            .with_token(ADMIN_TOKEN, admin),
    )
}

/// Counts how often the service asks the provider to resolve a token.
struct CountingProvider {
    inner: AuthState,
    authentications: AtomicUsize,
}

#[async_trait]
impl AuthProvider for CountingProvider {
    async fn authenticate(&self, token: &str) -> Option<CurrentUser> {
        self.authentications.fetch_add(1, Ordering::SeqCst);
        self.inner.authenticate(token).await
    }

    async fn find_user(&self, id: Uuid) -> Option<CurrentUser> {
        self.inner.find_user(id).await
    }
}

async fn spawn_app_with(config: AppConfig) -> TestApp {
    spawn_app_with_provider(config, provider()).await
}

async fn spawn_app_with_provider(config: AppConfig, auth: AuthState) -> TestApp {
    let state = AppState::build(config, auth).expect("route table must build");
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default()).await
}

async fn navigate(app: &TestApp, path: &str, token: Option<&str>) -> Value {
    let mut request = reqwest::Client::new()
        .get(format!("{}/api/navigate", app.address))
        .query(&[("path", path)]);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address))
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_route_listing_keeps_declaration_order() {
    let app = spawn_app().await;
    let routes: Vec<Value> = reqwest::get(format!("{}/api/routes", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(routes.len(), 19);
    assert_eq!(routes[0]["name"], "login");
    assert_eq!(routes[0]["middleware"], "Public");
    assert_eq!(routes[0]["guest_only"], true);
    let last = routes.last().unwrap();
    assert_eq!(last["name"], "not_found");
    assert!(last.get("middleware").is_none());
}

#[tokio::test]
async fn test_public_site_deployment() {
    let app = spawn_app_with(AppConfig {
        table: TableVariant::PublicSite,
        ..AppConfig::default()
    })
    .await;
    let routes: Vec<Value> = reqwest::get(format!("{}/api/routes", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = routes.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["login", "main", "unauthorized", "not_found"]);
}

#[tokio::test]
async fn test_users_without_session_redirects_to_login() {
    let app = spawn_app().await;
    let body = navigate(&app, "/usuarios", None).await;

    assert_eq!(body["route"], "users");
    assert_eq!(body["decision"], "redirect");
    assert_eq!(body["redirect_to"], "login");
    assert_eq!(body["redirect_href"], "/iniciar_sesion?redirect=%2Fusuarios");
    assert!(body.get("view").is_none());
}

#[tokio::test]
async fn test_login_with_session_redirects_home() {
    let app = spawn_app().await;
    let body = navigate(&app, "/iniciar_sesion", Some(OPERATOR_TOKEN)).await;

    assert_eq!(body["route"], "login");
    assert_eq!(body["decision"], "redirect");
    assert_eq!(body["redirect_to"], "main");
    assert_eq!(body["redirect_href"], "/");
}

#[tokio::test]
async fn test_login_with_session_proceeds_when_policy_disabled() {
    let app = spawn_app_with(AppConfig {
        redirect_authenticated_guests: false,
        ..AppConfig::default()
    })
    .await;
    let body = navigate(&app, "/iniciar_sesion", Some(OPERATOR_TOKEN)).await;

    assert_eq!(body["decision"], "proceed");
    assert_eq!(body["view"]["source"], "views/public/UserLogin.vue");
}

#[tokio::test]
async fn test_branch_list_extracts_company_id() {
    let app = spawn_app().await;
    let body = navigate(&app, "/empresas/42/sucursales", Some(ADMIN_TOKEN)).await;

    assert_eq!(body["route"], "branches");
    assert_eq!(body["params"]["company_id"], "42");
    assert_eq!(body["decision"], "proceed");
    assert_eq!(body["view"]["asset"], "assets/views/branches/BranchList.js");
    assert_eq!(body["document_title"], "Sucursales | SOLMETEC");
}

#[tokio::test]
async fn test_missing_permission_redirects_to_unauthorized() {
    let app = spawn_app().await;
    let body = navigate(&app, "/empresas", Some(OPERATOR_TOKEN)).await;

    assert_eq!(body["decision"], "redirect");
    assert_eq!(body["redirect_to"], "unauthorized");
    assert_eq!(body["redirect_href"], "/no_autorizado");
}

#[tokio::test]
async fn test_unknown_path_matches_not_found_for_everyone() {
    let app = spawn_app().await;
    for token in [None, Some(OPERATOR_TOKEN)] {
        let body = navigate(&app, "/does/not/exist", token).await;
        assert_eq!(body["route"], "not_found");
        assert_eq!(body["params"]["pathMatch"], "does/not/exist");
        assert_eq!(body["decision"], "proceed");
    }
}

#[tokio::test]
async fn test_navigate_requires_path() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/api/navigate", app.address))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_route_href() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let ok: Value = client
        .get(format!("{}/api/routes/branch_edit/href", app.address))
        .query(&[("company_id", "42"), ("id", "7")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ok["href"], "/empresas/42/sucursales/7/editar");

    let missing = client
        .get(format!("{}/api/routes/branch_edit/href", app.address))
        .query(&[("company_id", "42")])
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unknown = client
        .get(format!("{}/api/routes/nope/href", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_endpoint_requires_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/session", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user: Value = client
        .get(format!("{}/api/session", app.address))
        .bearer_auth(OPERATOR_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["role"], "operator");
    assert_eq!(user["permissions"][0], "users");
}

#[tokio::test]
async fn test_session_endpoint_resolves_the_token_once() {
    let counting = Arc::new(CountingProvider {
        inner: provider(),
        authentications: AtomicUsize::new(0),
    });
    let app = spawn_app_with_provider(AppConfig::default(), counting.clone()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/session", app.address))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "admin");
    assert_eq!(counting.authentications.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_href_with_reserved_characters_navigates_back_to_the_route() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for id in ["a/b", "?x", "a b"] {
        let body: Value = client
            .get(format!("{}/api/routes/user_show/href", app.address))
            .query(&[("id", id)])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let href = body["href"].as_str().unwrap().to_string();

        let navigation = navigate(&app, &href, Some(ADMIN_TOKEN)).await;
        assert_eq!(navigation["route"], "user_show", "{id} -> {href}");
        assert_eq!(navigation["params"]["id"], id);
    }
}

#[tokio::test]
async fn test_doubled_slash_redirect_stays_on_site() {
    let app = spawn_app().await;
    let body = navigate(&app, "//usuarios", None).await;

    assert_eq!(body["route"], "users");
    assert_eq!(body["redirect_href"], "/iniciar_sesion?redirect=%2Fusuarios");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address))
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
