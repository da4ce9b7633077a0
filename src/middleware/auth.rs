use axum::{
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    extract::{Request, State},
    body::Body,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_sessions::Session;
use crate::errors::{AppError, AppResult};
use crate::models::Identity;
use crate::state::AppState;

pub const SESSION_USER: &str = "user_session";
pub const REMEMBER_COOKIE: &str = "remember_token";

/// The identity stored in the session, if any.
pub async fn current_identity(session: &Session) -> AppResult<Identity> {
    session
        .get::<String>(SESSION_USER)
        .await?
        .map(Identity::new)
        .ok_or(AppError::Unauthenticated)
}

// Same id cycling as an interactive login
async fn restore_session(
    session: &Session,
    identity: Identity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(SESSION_USER, identity.email).await
}

/// Re-establishes a session from the remember cookie when the request has none.
pub async fn remember_me(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> Response {
    match session.get::<String>(SESSION_USER).await {
        Ok(Some(_)) => return next.run(req).await,
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            return next.run(req).await;
        }
    }

    let Some(token) = jar.get(REMEMBER_COOKIE).map(|c| c.value().to_string()) else {
        return next.run(req).await;
    };

    match state.accounts.resolve_remember_token(&token).await {
        Ok(Some(identity)) => {
            if let Err(e) = restore_session(&session, identity).await {
                tracing::error!("Session error: {}", e);
            }
            next.run(req).await
        }
        Ok(None) => {
            // Stale or revoked token: drop the cookie along with the response
            let jar = jar.remove(Cookie::build(REMEMBER_COOKIE).path("/"));
            (jar, next.run(req).await).into_response()
        }
        Err(e) => {
            tracing::error!("Remember token lookup failed: {}", e);
            next.run(req).await
        }
    }
}

pub async fn require_auth(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path == "/login" || path == "/register" {
        return next.run(req).await;
    }

    match session.get::<String>(SESSION_USER).await {
        Ok(Some(_)) => next.run(req).await,
        _ => {
            tracing::debug!("No user in session, redirecting to login");
            Redirect::to("/login").into_response()
        }
    }
}
