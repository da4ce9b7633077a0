use std::sync::Arc;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use crate::config::AuthConfig;
use crate::errors::{AccountError, AccountResult, StoreError};
use crate::models::{Account, Identity};
use super::{AccountStore, CredentialHash};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

// 32 bytes = 256 bits of entropy
const REMEMBER_TOKEN_BYTES: usize = 32;
const TEMP_PASSWORD_BYTES: usize = 12;
const TOKEN_ATTEMPTS: usize = 3;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Parses the admin quota field: a non-negative integer, or blank / "unlimited" for no limit.
pub fn parse_quota(input: &str) -> AccountResult<Option<u32>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("unlimited") {
        return Ok(None);
    }
    input
        .parse::<u32>()
        .map(Some)
        .map_err(|_| AccountError::InvalidQuota(input.to_string()))
}

fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Registration, login, remember tokens, quota accounting and admin mutations.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    admin_email: String,
    default_quota: u32,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, auth: &AuthConfig) -> Self {
        Self {
            store,
            admin_email: auth.admin_email.clone(),
            default_quota: auth.default_quota,
            bcrypt_cost: auth.bcrypt_cost,
        }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity.email == self.admin_email
    }

    /// Creates the admin account if it is missing. Returns the password when one had to be generated.
    pub async fn bootstrap_admin(&self, password: Option<&str>) -> AccountResult<Option<String>> {
        if self.store.get(&self.admin_email).await?.is_some() {
            tracing::debug!("Admin account {} already exists", self.admin_email);
            return Ok(None);
        }

        let generated = match password {
            Some(_) => None,
            None => Some(random_urlsafe(TEMP_PASSWORD_BYTES)),
        };
        let plaintext = password.or(generated.as_deref()).unwrap_or_default();
        let hash = CredentialHash::from_plaintext(plaintext, self.bcrypt_cost)?;
        let admin = Account::new(self.admin_email.clone(), hash, None, true);

        if self.store.insert(&admin).await? {
            tracing::info!("Admin user {} created", self.admin_email);
            Ok(generated)
        } else {
            // Another instance created it first
            Ok(None)
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> AccountResult<()> {
        if !is_valid_email(email) {
            tracing::error!("Invalid email format for registration: {}", email);
            return Err(AccountError::InvalidEmail);
        }

        let hash = CredentialHash::from_plaintext(password, self.bcrypt_cost)?;
        let account = Account::new(email.to_string(), hash, Some(self.default_quota), false);

        if !self.store.insert(&account).await.map_err(|e| {
            tracing::error!("Registration failed for {}: {}", email, e);
            e
        })? {
            tracing::warn!("Registration failed: {} already exists", email);
            return Err(AccountError::DuplicateAccount);
        }

        tracing::info!("User registered: {}", email);
        Ok(())
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> AccountResult<Identity> {
        let account = self.check_credentials(email, password).await?;
        self.record_login(&account).await
    }

    /// Authenticates and issues a remember token. `last_login` is only recorded once the token is stored.
    pub async fn authenticate_remembered(
        &self,
        email: &str,
        password: &str,
    ) -> AccountResult<(Identity, String)> {
        let account = self.check_credentials(email, password).await?;
        let token = self.issue_remember_token(&account.identity()).await?;
        let identity = self.record_login(&account).await?;
        Ok((identity, token))
    }

    async fn check_credentials(&self, email: &str, password: &str) -> AccountResult<Account> {
        if !is_valid_email(email) {
            tracing::error!("Invalid email format: {}", email);
            return Err(AccountError::InvalidEmail);
        }

        let account = match self.store.get(email).await? {
            Some(account) if account.password_hash.verify(password) => account,
            _ => {
                tracing::warn!("Login failed for {}: invalid credentials", email);
                return Err(AccountError::InvalidCredentials);
            }
        };

        if !account.approved {
            tracing::warn!("Login failed for {}: awaiting approval", email);
            return Err(AccountError::NotApproved);
        }
        Ok(account)
    }

    async fn record_login(&self, account: &Account) -> AccountResult<Identity> {
        let now = Utc::now();
        self.store.touch_last_login(&account.email, now).await.map_err(|e| {
            tracing::error!("Failed to update last_login for {}: {}", account.email, e);
            e
        })?;

        tracing::info!("User {} logged in at {}", account.email, now.format("%Y-%m-%d %H:%M:%S %Z"));
        Ok(account.identity())
    }

    /// Generates a fresh remember token for `identity`, replacing any previous one.
    pub async fn issue_remember_token(&self, identity: &Identity) -> AccountResult<String> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = random_urlsafe(REMEMBER_TOKEN_BYTES);
            match self.store.set_remember_token(&identity.email, &token).await {
                Ok(true) => {
                    tracing::info!("Remember token set for {}", identity.email);
                    return Ok(token);
                }
                Ok(false) => return Err(AccountError::AccountNotFound(identity.email.clone())),
                Err(StoreError::TokenCollision) => {
                    tracing::warn!("Remember token collision for {}, retrying", identity.email)
                }
                Err(e) => {
                    tracing::error!("Failed to save remember token for {}: {}", identity.email, e);
                    return Err(e.into());
                }
            }
        }
        Err(StoreError::TokenCollision.into())
    }

    /// Resolves a remember cookie. Unknown tokens and unapproved accounts are not errors.
    pub async fn resolve_remember_token(&self, token: &str) -> AccountResult<Option<Identity>> {
        let Some(account) = self.store.find_by_remember_token(token).await? else {
            tracing::warn!("Auto-login failed: invalid remember token");
            return Ok(None);
        };

        if !account.approved {
            tracing::warn!("Auto-login failed for {}: not approved", account.email);
            return Ok(None);
        }

        let now = Utc::now();
        if let Err(e) = self.store.touch_last_login(&account.email, now).await {
            tracing::error!("Failed to update last_login for {}: {}", account.email, e);
        } else {
            tracing::info!("Auto-login successful for {}", account.email);
        }
        Ok(Some(account.identity()))
    }

    pub async fn clear_remember_token(&self, identity: &Identity) -> AccountResult<()> {
        self.store.clear_remember_token(&identity.email).await.map_err(|e| {
            tracing::error!("Failed to clear remember token for {}: {}", identity.email, e);
            e
        })?;
        tracing::info!("Remember token cleared for {}", identity.email);
        Ok(())
    }

    pub async fn account(&self, identity: &Identity) -> AccountResult<Account> {
        self.store
            .get(&identity.email)
            .await?
            .ok_or_else(|| AccountError::AccountNotFound(identity.email.clone()))
    }

    /// Loads the account and refuses it when it has no chart generations left.
    pub async fn require_quota(&self, identity: &Identity) -> AccountResult<Account> {
        let account = self.account(identity).await?;
        if account.quota_exhausted() && !self.is_admin(identity) {
            tracing::info!("Quota reached for {}", identity.email);
            return Err(AccountError::QuotaExhausted(identity.email.clone()));
        }
        Ok(account)
    }

    /// Charges one chart generation. The admin account and unlimited accounts are never charged.
    pub async fn decrement_quota(&self, identity: &Identity) -> AccountResult<Option<u32>> {
        if self.is_admin(identity) {
            return Ok(None);
        }
        let remaining = self.store.decrement_quota(&identity.email).await.map_err(|e| {
            tracing::error!("Failed to decrement quota for {}: {}", identity.email, e);
            e
        })?;
        if let Some(quota) = remaining {
            tracing::info!("Quota decremented for {}: new quota={}", identity.email, quota);
        }
        Ok(remaining)
    }

    pub async fn approve(&self, email: &str) -> AccountResult<()> {
        if !is_valid_email(email) {
            return Err(AccountError::InvalidEmail);
        }
        if !self.store.set_approved(email, true).await? {
            tracing::warn!("User {} not found for approval", email);
            return Err(AccountError::AccountNotFound(email.to_string()));
        }
        tracing::info!("User {} approved", email);
        Ok(())
    }

    pub async fn set_quota(&self, email: &str, quota: Option<u32>) -> AccountResult<()> {
        if !is_valid_email(email) {
            return Err(AccountError::InvalidEmail);
        }
        if !self.store.set_quota(email, quota).await? {
            tracing::warn!("User {} not found for quota update", email);
            return Err(AccountError::AccountNotFound(email.to_string()));
        }
        tracing::info!("Quota updated for {}: {:?}", email, quota);
        Ok(())
    }

    /// Sets a random temporary password and returns it. It is shown once and never stored in plaintext.
    pub async fn reset_password(&self, email: &str) -> AccountResult<String> {
        if !is_valid_email(email) {
            return Err(AccountError::InvalidEmail);
        }
        let password = random_urlsafe(TEMP_PASSWORD_BYTES);
        let hash = CredentialHash::from_plaintext(&password, self.bcrypt_cost)?;
        // Remembered browsers must log in with the new password
        if !self.store.reset_credentials(email, &hash).await? {
            tracing::warn!("User {} not found for password reset", email);
            return Err(AccountError::AccountNotFound(email.to_string()));
        }
        tracing::info!("Password reset for {}", email);
        Ok(password)
    }

    pub async fn list_accounts(&self) -> AccountResult<Vec<Account>> {
        Ok(self.store.list().await?)
    }
}
