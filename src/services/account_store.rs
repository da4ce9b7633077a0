use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::errors::StoreResult;
use crate::models::Account;
use super::CredentialHash;

/// Persistence for accounts. Every method is a single atomic operation on the backing store.
///
/// Methods that target one account return `Ok(false)` when the account does not exist.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts `account` unless its email is already taken. Returns whether it was inserted.
    async fn insert(&self, account: &Account) -> StoreResult<bool>;

    async fn get(&self, email: &str) -> StoreResult<Option<Account>>;

    /// All accounts, ordered by email.
    async fn list(&self) -> StoreResult<Vec<Account>>;

    async fn set_approved(&self, email: &str, approved: bool) -> StoreResult<bool>;

    async fn set_quota(&self, email: &str, quota: Option<u32>) -> StoreResult<bool>;

    /// Replaces the password hash and revokes the remember token in one step.
    async fn reset_credentials(&self, email: &str, hash: &CredentialHash) -> StoreResult<bool>;

    async fn touch_last_login(&self, email: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Stores `token` as the account's only remember token, dropping any previous one.
    /// Fails with `TokenCollision` if another account already holds `token`.
    async fn set_remember_token(&self, email: &str, token: &str) -> StoreResult<bool>;

    async fn clear_remember_token(&self, email: &str) -> StoreResult<()>;

    async fn find_by_remember_token(&self, token: &str) -> StoreResult<Option<Account>>;

    /// Clamped decrement of a limited quota. Returns the new quota, or `None` when unlimited.
    /// Fails with `MissingAccount` if the account does not exist.
    async fn decrement_quota(&self, email: &str) -> StoreResult<Option<u32>>;
}
