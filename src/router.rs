use axum::{
    routing::{get, post},
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tower_sessions::{cookie::{Key, SameSite}, Expiry, MemoryStore, SessionManagerLayer};
use crate::{handlers, middleware, state::AppState};

/// Builds the application with sessions, remember-me auto-login and route protection.
///
/// The session secret must already be validated to be at least 64 bytes.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Session store setup
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.session.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_name(config.session.cookie_name.clone())
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session.idle_minutes)))
        .with_signed(Key::from(config.session.secret.as_bytes()));

    Router::new()
        // Auth routes
        .route("/login", get(handlers::serve_login_page).post(handlers::handle_login))
        .route("/register", get(handlers::serve_register_page).post(handlers::handle_register))
        .route("/logout", post(handlers::handle_logout))

        // Chart routes
        .route("/", get(handlers::serve_index).post(handlers::generate_chart))

        // Admin routes
        .route("/admin", get(handlers::serve_admin_panel).post(handlers::handle_admin_action))

        // Add middleware
        .layer(from_fn(middleware::require_auth))
        .layer(from_fn_with_state(state.clone(), middleware::remember_me))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())

        // Form size limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))

        // Add state
        .with_state(state)
}
