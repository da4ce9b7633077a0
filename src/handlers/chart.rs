use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tower_sessions::Session;
use crate::errors::{AccountError, AppResult};
use crate::macc::{ChartRequest, MaccCurve};
use crate::middleware::current_identity;
use crate::models::{Account, ChartForm, Identity};
use crate::state::AppState;
use crate::views::{self, IndexView};

// Only approved accounts with quota left may use the chart page
async fn chart_account(state: &AppState, session: &Session) -> AppResult<(Identity, Account)> {
    let identity = current_identity(session).await?;
    let account = state.accounts.account(&identity).await?;
    if !account.approved {
        tracing::warn!("Access denied for {}: not approved", identity.email);
        return Err(AccountError::NotApproved.into());
    }
    let account = state.accounts.require_quota(&identity).await?;
    Ok((identity, account))
}

pub async fn serve_index(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    let (identity, account) = chart_account(&state, &session).await?;
    tracing::debug!("Rendering index page for {}", identity.email);

    Ok(views::index_page(IndexView {
        account: &account,
        is_admin: state.accounts.is_admin(&identity),
        message: "",
        chart: None,
    })
    .into_response())
}

pub async fn generate_chart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ChartForm>,
) -> AppResult<Response> {
    let (identity, mut account) = chart_account(&state, &session).await?;
    let is_admin = state.accounts.is_admin(&identity);

    let request = match ChartRequest::parse(
        &form.project_name,
        &form.categories,
        &form.values,
        &form.widths,
        form.line_value.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Input rejected for {}: {}", identity.email, e);
            let page = views::index_page(IndexView {
                account: &account,
                is_admin,
                message: &format!("Error: {}", e),
                chart: None,
            });
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    let curve = MaccCurve::build(&request, &mut rand::thread_rng());
    let total = curve.total_abatement;
    let png = state.renderer.render(curve).await.map_err(|e| {
        tracing::error!("Chart generation failed for {}: {}", identity.email, e);
        e
    })?;

    // Charged only once the chart exists
    if let Some(remaining) = state.accounts.decrement_quota(&identity).await? {
        account.quota = Some(remaining);
    }
    tracing::info!(
        "Chart generated for {}: {} bars, total abatement {:.1}",
        identity.email,
        request.categories.len(),
        total
    );

    let encoded = STANDARD.encode(png);
    Ok(views::index_page(IndexView {
        account: &account,
        is_admin,
        message: "",
        chart: Some(&encoded),
    })
    .into_response())
}
