use crate::{
    auth::Session,
    route_table::{Meta, Middleware, RouteMatch},
};

/// Decision
///
/// The guard's verdict for one navigation attempt. There is no pending or
/// blocked state: the engine either proceeds or follows the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    RedirectTo(Redirect),
}

/// Redirect
///
/// Target route name plus, for login redirects, the path the visitor originally
/// asked for so the login view can send them back after signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub route: String,
    pub redirect: Option<String>,
}

impl Decision {
    pub fn redirect_to(route: impl Into<String>) -> Self {
        Decision::RedirectTo(Redirect {
            route: route.into(),
            redirect: None,
        })
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Decision::Proceed)
    }

    /// Name of the redirect target, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Decision::Proceed => None,
            Decision::RedirectTo(redirect) => Some(&redirect.route),
        }
    }
}

/// GuardPolicy
///
/// Route names the guard redirects to, and whether authenticated visitors of
/// login-only pages are sent home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    pub login_route: String,
    pub home_route: String,
    pub unauthorized_route: String,
    pub redirect_authenticated_guests: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            login_route: "login".to_string(),
            home_route: "main".to_string(),
            unauthorized_route: "unauthorized".to_string(),
            redirect_authenticated_guests: true,
        }
    }
}

/// NavigationGuard
///
/// Runs before every navigation and gates it on the target's `meta.middleware`:
/// - no tag: unguarded, always proceeds.
/// - `Public`: always proceeds, except that an authenticated visitor of a
///   login-only page is sent to the home route when the policy asks for it.
/// - `Auth`: anonymous visitors go to the login route carrying the requested
///   path; authenticated visitors lacking the route's permission go to the
///   unauthorized route.
#[derive(Debug, Clone, Default)]
pub struct NavigationGuard {
    policy: GuardPolicy,
}

impl NavigationGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    pub fn decide(&self, target: &RouteMatch<'_>, session: &Session) -> Decision {
        let meta = target.route.meta();

        let decision = match meta.and_then(|meta| meta.middleware) {
            None => Decision::Proceed,
            Some(Middleware::Public) => self.public(meta, session),
            Some(Middleware::Auth) => self.auth(target, meta, session),
        };

        match &decision {
            Decision::Proceed => {
                tracing::debug!(route = target.route.name(), "navigation allowed");
            }
            Decision::RedirectTo(redirect) => {
                tracing::info!(
                    route = target.route.name(),
                    redirect_to = %redirect.route,
                    authenticated = session.is_authenticated(),
                    "navigation redirected"
                );
            }
        }
        decision
    }

    fn public(&self, meta: Option<&Meta>, session: &Session) -> Decision {
        let guest_only = meta.is_some_and(|meta| meta.guest_only);
        if guest_only && session.is_authenticated() && self.policy.redirect_authenticated_guests {
            return Decision::redirect_to(&self.policy.home_route);
        }
        Decision::Proceed
    }

    fn auth(&self, target: &RouteMatch<'_>, meta: Option<&Meta>, session: &Session) -> Decision {
        let Some(user) = session.user() else {
            return Decision::RedirectTo(Redirect {
                route: self.policy.login_route.clone(),
                redirect: Some(preserved_path(&target.path)),
            });
        };

        match meta.and_then(|meta| meta.permission.as_deref()) {
            Some(permission) if !user.has_permission(permission) => {
                Decision::redirect_to(&self.policy.unauthorized_route)
            }
            _ => Decision::Proceed,
        }
    }
}

/// The requested path as handed back to the login view. Leading slashes and
/// backslashes collapse to a single `/` so the value never reads as a
/// protocol-relative URL (`//host`).
fn preserved_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches(['/', '\\']))
}
