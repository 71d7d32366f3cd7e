use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::Decision,
    navigation::Navigation,
    route_table::{Middleware, Route, ViewModule},
};

// --- Route Table Schemas (Output) ---

/// RouteSummary
///
/// One route table entry as exposed to the front-end shell (GET /api/routes).
/// The component is reported by its source module only; resolution stays lazy.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    #[schema(example = "branches")]
    pub name: String,
    #[schema(example = "/empresas/:company_id/sucursales")]
    pub path: String,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middleware: Option<Middleware>,
    pub guest_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        let meta = route.meta();
        Self {
            name: route.name().to_string(),
            path: route.path().to_string(),
            component: route.component().source().to_string(),
            title: meta.map(|m| m.title.clone()),
            icon: meta.and_then(|m| m.icon.clone()),
            middleware: route.middleware(),
            guest_only: meta.is_some_and(|m| m.guest_only),
            permission: meta.and_then(|m| m.permission.clone()),
        }
    }
}

/// HrefResponse
///
/// Output of reverse URL generation (GET /api/routes/{name}/href).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HrefResponse {
    #[schema(example = "/empresas/42/sucursales")]
    pub href: String,
}

// --- Navigation Schemas (Output) ---

/// DecisionKind
///
/// Wire form of the guard verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DecisionKind {
    Proceed,
    Redirect,
}

/// NavigationResponse
///
/// Output of GET /api/navigate: the matched route, its parameters, and what the
/// shell must do next.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationResponse {
    /// The path as requested.
    #[schema(example = "/usuarios")]
    pub path: String,
    /// Name of the matched route.
    #[schema(example = "users")]
    pub route: String,
    pub params: BTreeMap<String, String>,
    pub decision: DecisionKind,
    /// Route name to redirect to (when `decision = redirect`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    /// Concrete redirect URL, including `?redirect=` for login redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_href: Option<String>,
    /// Resolved view (when `decision = proceed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewModule>,
    #[schema(example = "Usuarios | SOLMETEC")]
    pub document_title: String,
    #[ts(type = "string")]
    pub evaluated_at: DateTime<Utc>,
}

impl From<Navigation<'_>> for NavigationResponse {
    fn from(navigation: Navigation<'_>) -> Self {
        let (decision, redirect_to) = match &navigation.decision {
            Decision::Proceed => (DecisionKind::Proceed, None),
            Decision::RedirectTo(redirect) => (DecisionKind::Redirect, Some(redirect.route.clone())),
        };

        Self {
            path: navigation.target.path,
            route: navigation.target.route.name().to_string(),
            params: navigation.target.params,
            decision,
            redirect_to,
            redirect_href: navigation.redirect_href,
            view: navigation.view.cloned(),
            document_title: navigation.document_title,
            evaluated_at: Utc::now(),
        }
    }
}
