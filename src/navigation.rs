use std::sync::Arc;

use crate::{
    auth::Session,
    guard::{Decision, GuardPolicy, NavigationGuard},
    pattern::Params,
    route_table::{RouteMatch, RouteTable, TableError, ViewModule},
};

/// Navigation
///
/// Everything the shell needs to carry out one navigation attempt.
#[derive(Debug, Clone)]
pub struct Navigation<'a> {
    pub target: RouteMatch<'a>,
    pub decision: Decision,
    /// Concrete URL of the redirect target, with `?redirect=` when the
    /// requested path is being preserved for after login.
    pub redirect_href: Option<String>,
    /// Resolved view. Only present when the navigation proceeds.
    pub view: Option<&'a ViewModule>,
    pub document_title: String,
}

/// Navigator
///
/// Binds a route table to a guard. Resolution and the guard decision are
/// synchronous; only obtaining the `Session` may have suspended beforehand.
#[derive(Debug)]
pub struct Navigator {
    table: Arc<RouteTable>,
    guard: NavigationGuard,
    app_name: String,
}

/// NavigatorState
///
/// Shared handle stored in `AppState`.
pub type NavigatorState = Arc<Navigator>;

impl Navigator {
    /// new
    ///
    /// Fails with `UnknownRoute` when the policy names a redirect target the
    /// table does not declare, or with `MissingParam` when that target needs
    /// parameters. Redirects must always be renderable.
    pub fn new(
        table: Arc<RouteTable>,
        policy: GuardPolicy,
        app_name: impl Into<String>,
    ) -> Result<Self, TableError> {
        for name in [&policy.login_route, &policy.home_route, &policy.unauthorized_route] {
            table.href(name, &Params::new())?;
        }

        Ok(Self {
            table,
            guard: NavigationGuard::new(policy),
            app_name: app_name.into(),
        })
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// navigate
    ///
    /// Resolves `path`, runs the guard, and on `Proceed` resolves the view.
    /// Returns `NoMatch` only for tables without a catch-all entry.
    pub fn navigate(&self, path: &str, session: &Session) -> Result<Navigation<'_>, TableError> {
        let target = self
            .table
            .resolve(path)
            .ok_or_else(|| TableError::NoMatch(path.to_string()))?;

        let decision = self.guard.decide(&target, session);

        let (view, redirect_href) = match &decision {
            Decision::Proceed => (Some(target.route.component().load()), None),
            Decision::RedirectTo(redirect) => {
                let mut href = self.table.href(&redirect.route, &Params::new())?;
                if let Some(requested) = &redirect.redirect {
                    let query = url::form_urlencoded::Serializer::new(String::new())
                        .append_pair("redirect", requested)
                        .finish();
                    href = format!("{href}?{query}");
                }
                (None, Some(href))
            }
        };

        let document_title = self.document_title(&target);

        Ok(Navigation {
            target,
            decision,
            redirect_href,
            view,
            document_title,
        })
    }

    /// `"<title> | <app name>"`, or just the app name for untitled routes and
    /// routes titled after the app itself.
    fn document_title(&self, target: &RouteMatch<'_>) -> String {
        match target.route.meta().map(|meta| meta.title.as_str()) {
            Some(title) if !title.is_empty() && title != self.app_name => {
                format!("{title} | {}", self.app_name)
            }
            _ => self.app_name.clone(),
        }
    }
}
