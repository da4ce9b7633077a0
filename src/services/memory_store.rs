use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::errors::{StoreError, StoreResult};
use crate::models::Account;
use super::{AccountStore, CredentialHash};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<String, Account>,
    remember: HashMap<String, String>,
}

/// In-process account store with the same atomicity as the Redis scripts: one lock per operation.
#[derive(Default)]
pub struct MemoryAccountStore {
    tables: Mutex<Tables>,
}

impl MemoryAccountStore {
    fn with_account<T>(&self, email: &str, f: impl FnOnce(&mut Account) -> T) -> Option<T> {
        let mut tables = self.tables.lock().unwrap();
        tables.accounts.get_mut(email).map(f)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.contains_key(&account.email) {
            return Ok(false);
        }
        tables.accounts.insert(account.email.clone(), account.clone());
        Ok(true)
    }

    async fn get(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.tables.lock().unwrap().accounts.get(email).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        Ok(self.tables.lock().unwrap().accounts.values().cloned().collect())
    }

    async fn set_approved(&self, email: &str, approved: bool) -> StoreResult<bool> {
        Ok(self.with_account(email, |a| a.approved = approved).is_some())
    }

    async fn set_quota(&self, email: &str, quota: Option<u32>) -> StoreResult<bool> {
        Ok(self.with_account(email, |a| a.quota = quota).is_some())
    }

    async fn reset_credentials(&self, email: &str, hash: &CredentialHash) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let Some(account) = tables.accounts.get_mut(email) else {
            return Ok(false);
        };
        account.password_hash = hash.clone();
        let previous = account.remember_token.take();
        if let Some(previous) = previous {
            tables.remember.remove(&previous);
        }
        Ok(true)
    }

    async fn touch_last_login(&self, email: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        Ok(self.with_account(email, |a| a.last_login = Some(at)).is_some())
    }

    async fn set_remember_token(&self, email: &str, token: &str) -> StoreResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.accounts.contains_key(email) {
            return Ok(false);
        }
        if tables.remember.contains_key(token) {
            return Err(StoreError::TokenCollision);
        }
        let account = tables.accounts.get_mut(email).unwrap();
        let previous = account.remember_token.replace(token.to_string());
        if let Some(previous) = previous {
            tables.remember.remove(&previous);
        }
        tables.remember.insert(token.to_string(), email.to_string());
        Ok(true)
    }

    async fn clear_remember_token(&self, email: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let previous = tables
            .accounts
            .get_mut(email)
            .and_then(|account| account.remember_token.take());
        if let Some(previous) = previous {
            tables.remember.remove(&previous);
        }
        Ok(())
    }

    async fn find_by_remember_token(&self, token: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .remember
            .get(token)
            .and_then(|email| tables.accounts.get(email))
            .cloned())
    }

    async fn decrement_quota(&self, email: &str) -> StoreResult<Option<u32>> {
        self.with_account(email, |account| {
            if let Some(quota) = account.quota.as_mut() {
                *quota = quota.saturating_sub(1);
            }
            account.quota
        })
        .ok_or_else(|| StoreError::MissingAccount(email.to_string()))
    }
}

/// Memory store whose named operations can be made to fail like a dropped Redis connection.
#[derive(Default)]
pub struct FlakyAccountStore {
    inner: MemoryAccountStore,
    failing: Mutex<HashSet<&'static str>>,
}

impl FlakyAccountStore {
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    fn check(&self, operation: &'static str) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(operation) {
            let dropped = redis::RedisError::from((redis::ErrorKind::IoError, "connection dropped"));
            return Err(dropped.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for FlakyAccountStore {
    async fn insert(&self, account: &Account) -> StoreResult<bool> {
        self.check("insert")?;
        self.inner.insert(account).await
    }

    async fn get(&self, email: &str) -> StoreResult<Option<Account>> {
        self.check("get")?;
        self.inner.get(email).await
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        self.check("list")?;
        self.inner.list().await
    }

    async fn set_approved(&self, email: &str, approved: bool) -> StoreResult<bool> {
        self.check("set_approved")?;
        self.inner.set_approved(email, approved).await
    }

    async fn set_quota(&self, email: &str, quota: Option<u32>) -> StoreResult<bool> {
        self.check("set_quota")?;
        self.inner.set_quota(email, quota).await
    }

    async fn reset_credentials(&self, email: &str, hash: &CredentialHash) -> StoreResult<bool> {
        self.check("reset_credentials")?;
        self.inner.reset_credentials(email, hash).await
    }

    async fn touch_last_login(&self, email: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        self.check("touch_last_login")?;
        self.inner.touch_last_login(email, at).await
    }

    async fn set_remember_token(&self, email: &str, token: &str) -> StoreResult<bool> {
        self.check("set_remember_token")?;
        self.inner.set_remember_token(email, token).await
    }

    async fn clear_remember_token(&self, email: &str) -> StoreResult<()> {
        self.check("clear_remember_token")?;
        self.inner.clear_remember_token(email).await
    }

    async fn find_by_remember_token(&self, token: &str) -> StoreResult<Option<Account>> {
        self.check("find_by_remember_token")?;
        self.inner.find_by_remember_token(token).await
    }

    async fn decrement_quota(&self, email: &str) -> StoreResult<Option<u32>> {
        self.check("decrement_quota")?;
        self.inner.decrement_quota(email).await
    }
}
