pub mod auth;

pub use auth::{AuthenticatedDoctor, JwtAuthMiddleware};
