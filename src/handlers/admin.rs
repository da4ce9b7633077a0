use axum::{
    extract::{Form, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use crate::errors::{AccountError, AppError, AppResult};
use crate::middleware::current_identity;
use crate::models::{AdminAction, AdminForm};
use crate::services::parse_quota;
use crate::state::AppState;
use crate::views;

// Anyone but the distinguished admin is sent back to the login page
async fn require_admin(state: &AppState, session: &Session) -> AppResult<()> {
    let identity = current_identity(session).await?;
    if !state.accounts.is_admin(&identity) {
        tracing::debug!("Admin access attempt by non-admin {}", identity.email);
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}

async fn render_panel(state: &AppState, message: &str) -> AppResult<Response> {
    let accounts = state.accounts.list_accounts().await?;
    Ok(views::admin_page(&accounts, message).into_response())
}

pub async fn serve_admin_panel(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    require_admin(&state, &session).await?;
    render_panel(&state, "").await
}

pub async fn handle_admin_action(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminForm>,
) -> AppResult<Response> {
    require_admin(&state, &session).await?;

    let email = form.username.trim();
    let action = form.action();
    tracing::debug!("Admin action {:?} for {}", action, email);

    let outcome: Result<String, AccountError> = match action {
        AdminAction::Approve => state
            .accounts
            .approve(email)
            .await
            .map(|()| format!("{} approved.", email)),
        AdminAction::ResetPassword => state
            .accounts
            .reset_password(email)
            .await
            .map(|password| {
                format!("Password reset for {}. New temporary password: {}", email, password)
            }),
        AdminAction::SetQuota(raw) => match parse_quota(&raw) {
            Ok(quota) => state
                .accounts
                .set_quota(email, quota)
                .await
                .map(|()| format!("Quota updated for {}", email)),
            Err(e) => Err(e),
        },
    };

    let message = outcome.unwrap_or_else(|e| e.to_string());
    render_panel(&state, &message).await
}
