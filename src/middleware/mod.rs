/// Middleware module
///
/// Custom middleware for authentication.

mod auth_middleware;

pub use auth_middleware::RequireAuth;
