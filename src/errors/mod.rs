// Error types for the account store, the account manager, chart generation and the HTTP layer.
use thiserror::Error;

pub mod account;
pub mod chart;
pub mod response;
pub mod store;

// Re-export commonly used types
pub use account::{AccountError, AccountResult};
pub use chart::{ChartError, ChartResult};
pub use store::{StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Account(AccountError::Internal(err))
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
