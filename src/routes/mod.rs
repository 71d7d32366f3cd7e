/// Router Module Index
///
/// HTTP routers grouped by access level. Access control is applied per group
/// through Axum layers in `create_router`.

/// Routes open to every caller. Navigation decisions for anonymous visitors
/// are answered here, not rejected.
pub mod public;

/// Routes wrapped in `auth_middleware`. Require a resolved session.
pub mod authenticated;
