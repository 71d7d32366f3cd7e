use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    provider::AuthState,
};

/// Role that implicitly holds every module permission.
pub const ADMIN_ROLE: &str = "admin";

/// Header accepted by the local development bypass.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of a session JWT. `role` and `permissions` are optional so tokens
/// minted by an identity provider that only sets `sub` still authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Expiration time (seconds since epoch). Always validated.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// CurrentUser
///
/// The resolved identity behind an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CurrentUser {
    pub id: Uuid,
    #[schema(example = "operator")]
    pub role: String,
    /// Module permissions, e.g. `users`, `companies`, `branches`.
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role == ADMIN_ROLE || self.permissions.iter().any(|p| p == permission)
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
        }
    }
}

/// Session
///
/// Authentication state for one navigation. Anonymous when no credential was
/// presented or the credential did not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<CurrentUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: CurrentUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }
}

/// resolve_user
///
/// Shared resolution used by both extractors:
/// 1. Local bypass: in `Env::Local`, an `x-user-id` header naming a user the
///    provider knows is accepted as-is.
/// 2. Bearer token: `Authorization: Bearer <token>` handed to the provider.
///
/// Any failure yields `None`; callers decide whether that is an error.
async fn resolve_user(parts: &Parts, auth: &AuthState, config: &AppConfig) -> Option<CurrentUser> {
    if config.env == Env::Local {
        let bypass_id = parts
            .headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok());
        if let Some(id) = bypass_id {
            if let Some(user) = auth.find_user(id).await {
                tracing::debug!(user_id = %id, "session resolved through local bypass");
                return Some(user);
            }
        }
    }
    // Production, or the bypass did not resolve: fall through to the bearer token.

    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))?;

    auth.authenticate(token).await
}

/// Session Extractor
///
/// Never rejects: navigation decisions need to see anonymous visitors too.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AuthState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(Session {
            user: resolve_user(parts, &auth, &config).await,
        })
    }
}

/// AuthUser
///
/// Extractor for endpoints that require a session. Rejects with
/// `401 Unauthorized` when the request does not resolve to a user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let config = AppConfig::from_ref(state);

        resolve_user(parts, &auth, &config)
            .await
            .map(AuthUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
