pub mod auth;
pub mod security_headers;

pub use auth::{AuthMiddleware, AuthenticatedUser};
pub use security_headers::SecurityHeaders;
