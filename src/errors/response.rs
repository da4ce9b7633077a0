use axum::{
    response::{IntoResponse, Response, Redirect},
    http::StatusCode,
};
use crate::errors::{AccountError, AppError, ChartError};
use crate::views;

// The IntoResponse trait implementation converts AppError into a well-formed HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Authentication errors redirect to login
            AppError::Unauthenticated => Redirect::to("/login").into_response(),

            AppError::Session(e) => {
                tracing::error!("Session store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.").into_response()
            }
            AppError::Account(err) => convert_account_error(err),
            AppError::Chart(err) => convert_chart_error(err),
        }
    }
}

fn convert_account_error(err: AccountError) -> Response {
    match err {
        // Signed in as an account that no longer exists
        AccountError::AccountNotFound(email) => {
            tracing::error!("Session user {} not found", email);
            Redirect::to("/login").into_response()
        }

        AccountError::QuotaExhausted(email) => {
            (StatusCode::FORBIDDEN, views::limit_page(&email)).into_response()
        }

        AccountError::NotApproved => {
            (StatusCode::FORBIDDEN, views::denied_page()).into_response()
        }

        err if err.is_internal() => {
            tracing::error!("Persistence failure: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }

        err => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

// Chart failures are reported as plain text carrying the cause
fn convert_chart_error(err: ChartError) -> Response {
    let status = match &err {
        err if err.is_input_error() => StatusCode::BAD_REQUEST,
        ChartError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, format!("Error processing your input: {}", err)).into_response()
}
