use std::env;
use uuid::Uuid;

use crate::{
    route_table::{RouteTable, TableError},
    tables,
};

/// AppConfig
///
/// Holds the service's entire configuration. Immutable once loaded and pulled
/// into handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local session bypass and log format.
    pub env: Env,
    // Secret used to validate incoming session JWTs (HS256).
    pub jwt_secret: String,
    // Which built-in route table to serve.
    pub table: TableVariant,
    // Optional JSON route table that replaces the built-in one.
    pub table_path: Option<String>,
    // Suffix for document titles.
    pub app_name: String,
    // Send authenticated visitors of login-only pages to the home view.
    pub redirect_authenticated_guests: bool,
    pub bind_addr: String,
    // Local-only: user id the `x-user-id` bypass header resolves to.
    pub dev_user_id: Option<Uuid>,
}

/// Env
///
/// Runtime context. `Local` enables development conveniences (header bypass,
/// pretty logs); `Production` requires every secret to be set explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// TableVariant
///
/// The two deployments of the navigation layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableVariant {
    Admin,
    PublicSite,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            table: TableVariant::Admin,
            table_path: None,
            app_name: tables::APP_TITLE.to_string(),
            redirect_authenticated_guests: true,
            bind_addr: "0.0.0.0:3000".to_string(),
            dev_user_id: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics when `JWT_SECRET` is missing in production, or when a variable is
    /// present but cannot be parsed. The service must not start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET")
                .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
        };

        let table = match env::var("ROUTE_TABLE").as_deref() {
            Err(_) | Ok("admin") => TableVariant::Admin,
            Ok("public") => TableVariant::PublicSite,
            Ok(other) => panic!("FATAL: ROUTE_TABLE must be `admin` or `public`, got `{other}`."),
        };

        let redirect_authenticated_guests = match env::var("REDIRECT_AUTHENTICATED_GUESTS") {
            Err(_) => true,
            Ok(value) => value
                .parse()
                .expect("FATAL: REDIRECT_AUTHENTICATED_GUESTS must be `true` or `false`."),
        };

        // The bypass identity only exists locally; production ignores the variable.
        let dev_user_id = match env {
            Env::Local => env::var("DEV_USER_ID").ok().map(|id| {
                Uuid::parse_str(&id).expect("FATAL: DEV_USER_ID must be a UUID.")
            }),
            Env::Production => None,
        };

        Self {
            env,
            jwt_secret,
            table,
            table_path: env::var("ROUTE_TABLE_PATH").ok(),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| tables::APP_TITLE.to_string()),
            redirect_authenticated_guests,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            dev_user_id,
        }
    }

    /// load_route_table
    ///
    /// Builds the table this deployment serves: the JSON document at
    /// `table_path` when set, otherwise the built-in variant.
    pub fn load_route_table(&self) -> Result<RouteTable, TableError> {
        match &self.table_path {
            Some(path) => {
                let document =
                    std::fs::read_to_string(path).map_err(|e| TableError::Unreadable {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                RouteTable::from_json(&document)
            }
            None => match self.table {
                TableVariant::Admin => tables::admin_panel(),
                TableVariant::PublicSite => tables::public_site(),
            },
        }
    }
}
