mod auth;

pub use auth::{current_identity, remember_me, require_auth, REMEMBER_COOKIE, SESSION_USER};
