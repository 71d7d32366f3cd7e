use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Claims, CurrentUser};

// 1. AuthProvider Contract
/// AuthProvider
///
/// The authentication-state provider the guard depends on. The navigation layer
/// never issues or refreshes credentials; it only asks who (if anyone) a
/// request belongs to. Swappable between the JWT validator used in deployment
/// and the in-memory directory used by tests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves a bearer token to its user. `None` for anything invalid or expired.
    async fn authenticate(&self, token: &str) -> Option<CurrentUser>;

    /// Looks a user up by id. Backs the local `x-user-id` bypass.
    async fn find_user(&self, id: Uuid) -> Option<CurrentUser>;
}

/// AuthState
///
/// Shared handle to the provider, stored in `AppState`.
pub type AuthState = Arc<dyn AuthProvider>;

// 2. The Real Implementation (JWT)
/// JwtAuthProvider
///
/// Validates HS256 session tokens signed with the configured secret. Expiry is
/// always enforced. The user identity and permissions are taken from the claims;
/// `known_users` only feeds `find_user` for the local bypass.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    known_users: HashMap<Uuid, CurrentUser>,
}

impl JwtAuthProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            known_users: HashMap::new(),
        }
    }

    pub fn with_known_user(mut self, user: CurrentUser) -> Self {
        self.known_users.insert(user.id, user);
        self
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn authenticate(&self, token: &str) -> Option<CurrentUser> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(CurrentUser::from(data.claims)),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                    _ => tracing::debug!(error = %e, "session token rejected"),
                }
                None
            }
        }
    }

    async fn find_user(&self, id: Uuid) -> Option<CurrentUser> {
        self.known_users.get(&id).cloned()
    }
}

// 3. The In-Memory Implementation (For Tests)
/// MemoryAuthProvider
///
/// Fixed directory of users and opaque tokens. Lets guard and handler tests
/// control the session without minting JWTs.
#[derive(Clone, Default)]
pub struct MemoryAuthProvider {
    users: HashMap<Uuid, CurrentUser>,
    tokens: HashMap<String, Uuid>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.users.insert(user.id, user);
        self
    }

    /// Registers `token` as a valid credential for the user with `id`.
    pub fn with_token(mut self, token: impl Into<String>, id: Uuid) -> Self {
        self.tokens.insert(token.into(), id);
        self
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn authenticate(&self, token: &str) -> Option<CurrentUser> {
        let id = self.tokens.get(token)?;
        self.users.get(id).cloned()
    }

    async fn find_user(&self, id: Uuid) -> Option<CurrentUser> {
        self.users.get(&id).cloned()
    }
}
