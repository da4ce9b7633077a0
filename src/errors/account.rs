use thiserror::Error;
use super::StoreError;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username must be a valid email address.")]
    InvalidEmail,

    #[error("User already exists.")]
    DuplicateAccount,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Awaiting admin approval.")]
    NotApproved,

    #[error("Quota exhausted for {0}")]
    QuotaExhausted(String),

    #[error("User not found.")]
    AccountNotFound(String),

    #[error("Invalid quota input.")]
    InvalidQuota(String),

    #[error("Internal server error.")]
    Internal(#[from] StoreError),

    #[error("Internal server error.")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AccountError {
    /// Whether the error came from the persistence layer rather than from user input.
    pub fn is_internal(&self) -> bool {
        matches!(self, AccountError::Internal(_) | AccountError::Hashing(_))
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
