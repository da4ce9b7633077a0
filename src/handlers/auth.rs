use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tower_sessions::Session;
use crate::errors::{AccountError, AppError, AppResult};
use crate::middleware::{current_identity, REMEMBER_COOKIE, SESSION_USER};
use crate::models::{AuthPageQuery, LoginForm, RegisterForm};
use crate::state::AppState;
use crate::views::{self, AuthPage};

// Authentication and validation errors render the form again with the message inline
fn form_error(page: AuthPage, err: AccountError) -> Response {
    let status = if err.is_internal() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, views::auth_page(page, &err.to_string())).into_response()
}

pub async fn serve_login_page(Query(query): Query<AuthPageQuery>) -> impl IntoResponse {
    views::auth_page(AuthPage::Login, query.message.as_deref().unwrap_or_default())
}

pub async fn serve_register_page() -> impl IntoResponse {
    views::auth_page(AuthPage::Register, "")
}

#[axum::debug_handler]
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(login_form): Form<LoginForm>,
) -> AppResult<Response> {
    let remember = login_form.remember.is_some();
    tracing::debug!("Login attempt for {}, remember={}", login_form.username, remember);

    let (username, password) = (&login_form.username, &login_form.password);
    let login = if remember {
        state
            .accounts
            .authenticate_remembered(username, password)
            .await
            .map(|(identity, token)| (identity, Some(token)))
    } else {
        state
            .accounts
            .authenticate(username, password)
            .await
            .map(|identity| (identity, None))
    };
    let (identity, token) = match login {
        Ok(login) => login,
        Err(e) => return Ok(form_error(AuthPage::Login, e)),
    };

    // Fresh session id for the new privilege level
    session.cycle_id().await?;
    session.insert(SESSION_USER, identity.email.clone()).await?;

    let Some(token) = token else {
        return Ok(Redirect::to("/").into_response());
    };

    let cookie = Cookie::build((REMEMBER_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.secure)
        .max_age(state.config.remember_max_age());
    tracing::debug!("Remember cookie set for {}", identity.email);

    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

pub async fn handle_register(
    State(state): State<AppState>,
    Form(register_form): Form<RegisterForm>,
) -> Response {
    tracing::debug!("Registration attempt for {}", register_form.username);

    match state
        .accounts
        .register(&register_form.username, &register_form.password)
        .await
    {
        Ok(()) => {
            let message = urlencoding::encode("Registered. Awaiting admin approval.");
            Redirect::to(&format!("/login?message={}", message)).into_response()
        }
        Err(e) => form_error(AuthPage::Register, e),
    }
}

#[axum::debug_handler]
pub async fn handle_logout(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<Response> {
    let cleared = match current_identity(&session).await {
        Ok(identity) => state.accounts.clear_remember_token(&identity).await,
        Err(_) => Ok(()),
    };

    // Session and cookie go regardless; a stored token left behind is reported
    session.flush().await?;
    let jar = jar.remove(Cookie::build(REMEMBER_COOKIE).path("/"));
    if let Err(e) = cleared {
        return Ok((jar, AppError::from(e)).into_response());
    }

    tracing::info!("User logged out");
    Ok((jar, Redirect::to("/login")).into_response())
}
