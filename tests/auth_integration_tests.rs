use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use solmetec_nav::{
    AppState, JwtAuthProvider, MemoryAuthProvider,
    auth::{AuthUser, Claims, CurrentUser, Session},
    config::{AppConfig, Env},
    provider::AuthState,
};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(user_id: Uuid, exp: u64, permissions: &[&str]) -> String {
    let claims = Claims {
        sub: user_id,
        iat: now() as usize,
        exp: exp as usize,
        role: "operator".to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env, auth: AuthState) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::build(config, auth).unwrap()
}

fn jwt_state(env: Env) -> AppState {
    create_app_state(env, Arc::new(JwtAuthProvider::new(TEST_JWT_SECRET)))
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

fn with_bypass_header(id: Uuid) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&id.to_string()).unwrap(),
    );
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_session_from_valid_jwt() {
    let token = create_token(TEST_USER_ID, now() + 3600, &["users"]);
    let state = jwt_state(Env::Production);

    let mut parts = with_bearer(&token);
    let session = Session::from_request_parts(&mut parts, &state).await.unwrap();

    assert!(session.is_authenticated());
    let user = session.user().unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, "operator");
    assert_eq!(user.permissions, vec!["users".to_string()]);
}

#[tokio::test]
async fn test_session_is_anonymous_without_header() {
    let state = jwt_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let session = Session::from_request_parts(&mut parts, &state).await.unwrap();

    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_expired_jwt_yields_anonymous_session() {
    // Well past the default validation leeway.
    let token = create_token(TEST_USER_ID, now() - 3600, &[]);
    let state = jwt_state(Env::Production);

    let mut parts = with_bearer(&token);
    let session = Session::from_request_parts(&mut parts, &state).await.unwrap();

    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_jwt_signed_with_other_secret_is_rejected() {
    let claims = Claims {
        sub: TEST_USER_ID,
        iat: now() as usize,
        exp: (now() + 3600) as usize,
        role: "admin".to_string(),
        permissions: vec![],
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();
    let state = jwt_state(Env::Production);

    let mut parts = with_bearer(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_user_rejects_non_bearer_scheme() {
    let state = jwt_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Basic dXNlcjpwYXNz"),
    );
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let dev_id = Uuid::new_v4();
    let provider = MemoryAuthProvider::new().with_user(CurrentUser {
        id: dev_id,
        role: "admin".to_string(),
        permissions: vec![],
    });
    let state = create_app_state(Env::Local, Arc::new(provider));

    let mut parts = with_bypass_header(dev_id);
    let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.id, dev_id);
    assert_eq!(user.role, "admin");
}

#[tokio::test]
async fn test_local_bypass_unknown_user_falls_through() {
    let state = jwt_state(Env::Local);

    let mut parts = with_bypass_header(Uuid::new_v4());
    let session = Session::from_request_parts(&mut parts, &state).await.unwrap();

    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let dev_id = Uuid::new_v4();
    let provider = MemoryAuthProvider::new().with_user(CurrentUser {
        id: dev_id,
        role: "admin".to_string(),
        permissions: vec![],
    });
    let state = create_app_state(Env::Production, Arc::new(provider));

    // Provide ONLY the local bypass header
    let mut parts = with_bypass_header(dev_id);
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert_eq!(auth_user.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_jwt_provider_known_users_back_the_bypass() {
    let dev_id = Uuid::new_v4();
    let provider = JwtAuthProvider::new(TEST_JWT_SECRET).with_known_user(CurrentUser {
        id: dev_id,
        role: "admin".to_string(),
        permissions: vec![],
    });
    let state = create_app_state(Env::Local, Arc::new(provider));

    let mut parts = with_bypass_header(dev_id);
    let session = Session::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(session.user().unwrap().id, dev_id);
}
