use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::pattern::{Params, PathPattern};

// --- Errors ---

/// TableError
///
/// Everything that can go wrong while building or querying a route table.
/// Construction errors (`Empty`, `InvalidPattern`, `DuplicateName`,
/// `CatchAllNotLast`, `Malformed`, `Unreadable`) are startup-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("route table is empty")]
    Empty,
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),
    #[error("catch-all route `{0}` must be declared last")]
    CatchAllNotLast(String),
    #[error("unknown route `{0}`")]
    UnknownRoute(String),
    #[error("route `{route}` requires parameter `{param}`")]
    MissingParam { route: String, param: String },
    #[error("no route matches `{0}`")]
    NoMatch(String),
    #[error("malformed route table document: {0}")]
    Malformed(String),
    #[error("cannot read route table `{path}`: {reason}")]
    Unreadable { path: String, reason: String },
}

// --- Metadata ---

/// Middleware
///
/// The access-control tag attached to a route. The set is closed: the guard
/// dispatches on it with a single `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum Middleware {
    /// Reachable by anyone.
    #[serde(alias = "public")]
    Public,
    /// Requires an authenticated session.
    #[serde(alias = "auth")]
    Auth,
}

/// Meta
///
/// Per-route metadata consumed by the shell (title, icon) and by the guard
/// (middleware, guest_only, permission).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_middleware",
        skip_serializing_if = "Option::is_none"
    )]
    pub middleware: Option<Middleware>,
    /// Login-only page: an authenticated visitor may be sent home instead.
    #[serde(default)]
    pub guest_only: bool,
    /// Module permission an authenticated user must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

impl Meta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.middleware = Some(Middleware::Public);
        self
    }

    pub fn auth(mut self) -> Self {
        self.middleware = Some(Middleware::Auth);
        self
    }

    pub fn guest_only(mut self) -> Self {
        self.guest_only = true;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }
}

/// An unrecognised middleware tag leaves the route unguarded instead of
/// failing the whole table.
fn lenient_middleware<'de, D>(deserializer: D) -> Result<Option<Middleware>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<Middleware>(value.clone()) {
            Ok(middleware) => Some(middleware),
            Err(_) => {
                tracing::warn!(middleware = %value, "unrecognised middleware tag; route left unguarded");
                None
            }
        },
    })
}

/// A meta block that does not parse (wrong field types, not an object) leaves
/// the route unguarded instead of failing the whole table.
fn lenient_meta<'de, D>(deserializer: D) -> Result<Option<Meta>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<Meta>(value.clone()) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(meta = %value, error = %e, "malformed route meta; route left unguarded");
                None
            }
        },
    })
}

// --- Lazy View Reference ---

/// ViewModule
///
/// The resolved form of a `ComponentRef`: the view's source module and the
/// asset the shell loads for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ViewModule {
    #[schema(example = "views/users/UserList.vue")]
    pub source: String,
    #[schema(example = "assets/views/users/UserList.js")]
    pub asset: String,
}

impl ViewModule {
    fn from_source(source: &str) -> Self {
        let stem = source.strip_suffix(".vue").unwrap_or(source);
        Self {
            source: source.to_string(),
            asset: format!("assets/{stem}.js"),
        }
    }
}

/// ComponentRef
///
/// Lazy reference to a view. Nothing is resolved at table construction; the
/// first navigation that proceeds to the route resolves it once and caches it.
#[derive(Debug, Deserialize)]
#[serde(from = "String")]
pub struct ComponentRef {
    source: String,
    module: OnceLock<ViewModule>,
}

impl ComponentRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            module: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.module.get().is_some()
    }

    pub fn load(&self) -> &ViewModule {
        self.module.get_or_init(|| {
            tracing::debug!(source = %self.source, "resolving view module");
            ViewModule::from_source(&self.source)
        })
    }
}

impl From<String> for ComponentRef {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl Serialize for ComponentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

// --- Descriptors ---

/// RouteDescriptor
///
/// One declared entry: URL pattern, unique name, lazy view and optional metadata.
/// This is also the shape of each element in a JSON route table document.
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub name: String,
    pub component: ComponentRef,
    #[serde(
        default,
        deserialize_with = "lenient_meta",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<Meta>,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, name: impl Into<String>, component: &str) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: ComponentRef::new(component),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Route
///
/// A descriptor together with its compiled pattern. Only `RouteTable` builds these.
#[derive(Debug)]
pub struct Route {
    descriptor: RouteDescriptor,
    pattern: PathPattern,
}

impl Route {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn path(&self) -> &str {
        &self.descriptor.path
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.descriptor.meta.as_ref()
    }

    pub fn middleware(&self) -> Option<Middleware> {
        self.meta().and_then(|meta| meta.middleware)
    }

    pub fn component(&self) -> &ComponentRef {
        &self.descriptor.component
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

/// RouteMatch
///
/// The result of resolving a requested path: the first matching route, the
/// parameters it captured, and the path as it was requested.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Params,
    pub path: String,
}

// --- The Table ---

/// RouteTable
///
/// Ordered, immutable sequence of routes. Resolution walks the table in
/// declaration order and the first match wins, so specific patterns must be
/// declared before general ones and a catch-all can only be the final entry.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// new
    ///
    /// Compiles and validates every descriptor. Fails on an empty table, an
    /// invalid pattern, a repeated name, or a catch-all that is not last.
    pub fn new(descriptors: Vec<RouteDescriptor>) -> Result<Self, TableError> {
        if descriptors.is_empty() {
            return Err(TableError::Empty);
        }

        let last = descriptors.len() - 1;
        let mut names = HashSet::with_capacity(descriptors.len());
        let mut routes = Vec::with_capacity(descriptors.len());

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let pattern =
                PathPattern::parse(&descriptor.path).map_err(|e| TableError::InvalidPattern {
                    pattern: descriptor.path.clone(),
                    reason: e.0,
                })?;

            if !names.insert(descriptor.name.clone()) {
                return Err(TableError::DuplicateName(descriptor.name));
            }
            if pattern.is_catch_all() && index != last {
                return Err(TableError::CatchAllNotLast(descriptor.name));
            }

            routes.push(Route {
                descriptor,
                pattern,
            });
        }

        tracing::debug!(routes = routes.len(), "route table compiled");
        Ok(Self { routes })
    }

    /// from_json
    ///
    /// Builds a table from a JSON array of descriptors, then validates it like `new`.
    pub fn from_json(document: &str) -> Result<Self, TableError> {
        let descriptors: Vec<RouteDescriptor> =
            serde_json::from_str(document).map_err(|e| TableError::Malformed(e.to_string()))?;
        Self::new(descriptors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name() == name)
    }

    /// resolve
    ///
    /// Returns the first route whose pattern matches `path`. With a catch-all
    /// entry present this never returns `None`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.pattern.matches(path).map(|params| RouteMatch {
                route,
                params,
                path: path.to_string(),
            })
        })
    }

    /// href
    ///
    /// Reverse URL generation for a named route.
    pub fn href(&self, name: &str, params: &Params) -> Result<String, TableError> {
        let route = self
            .get(name)
            .ok_or_else(|| TableError::UnknownRoute(name.to_string()))?;
        route
            .pattern
            .to_href(params)
            .map_err(|param| TableError::MissingParam {
                route: name.to_string(),
                param,
            })
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
