use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use crate::errors::{StoreError, StoreResult};
use crate::models::Account;
use super::{AccountStore, CredentialHash};

const ACCOUNT_INDEX: &str = "accounts";
const REMEMBER_PREFIX: &str = "remember:";

// KEYS: account hash, account index. ARGV: email, then field/value pairs.
static INSERT_ACCOUNT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV, 2))
        redis.call('SADD', KEYS[2], ARGV[1])
        return 1
        ",
    )
});

// KEYS: account hash. ARGV: field/value pairs.
static UPDATE_FIELDS: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV))
        return 1
        ",
    )
});

// KEYS: account hash. ARGV: field.
static CLEAR_FIELD: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HDEL', KEYS[1], ARGV[1])
        return 1
        ",
    )
});

// KEYS: account hash, new token index key. ARGV: email, token, index prefix, ttl seconds.
static SET_REMEMBER_TOKEN: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        if not redis.call('SET', KEYS[2], ARGV[1], 'NX', 'EX', ARGV[4]) then
            return -1
        end
        local old = redis.call('HGET', KEYS[1], 'remember_token')
        if old and old ~= ARGV[2] then
            redis.call('DEL', ARGV[3] .. old)
        end
        redis.call('HSET', KEYS[1], 'remember_token', ARGV[2])
        return 1
        ",
    )
});

// KEYS: account hash. ARGV: index prefix.
static CLEAR_REMEMBER_TOKEN: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        local old = redis.call('HGET', KEYS[1], 'remember_token')
        if old then
            redis.call('DEL', ARGV[1] .. old)
            redis.call('HDEL', KEYS[1], 'remember_token')
        end
        return 1
        ",
    )
});

// KEYS: account hash. ARGV: password hash, index prefix.
static RESET_CREDENTIALS: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HSET', KEYS[1], 'password_hash', ARGV[1])
        local old = redis.call('HGET', KEYS[1], 'remember_token')
        if old then
            redis.call('DEL', ARGV[2] .. old)
            redis.call('HDEL', KEYS[1], 'remember_token')
        end
        return 1
        ",
    )
});

// KEYS: account hash. Returns -2 for a missing account, -1 for unlimited, else the new quota.
static DECREMENT_QUOTA: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return -2
        end
        local quota = redis.call('HGET', KEYS[1], 'quota')
        if not quota then
            return -1
        end
        local remaining = tonumber(quota) - 1
        if remaining < 0 then
            remaining = 0
        end
        redis.call('HSET', KEYS[1], 'quota', remaining)
        return remaining
        ",
    )
});

fn account_key(email: &str) -> String {
    format!("account:{}", email)
}

fn remember_key(token: &str) -> String {
    format!("{}{}", REMEMBER_PREFIX, token)
}

/// Redis-backed account store. Each mutation runs as one Lua script, so it applies fully or not at all.
#[derive(Clone)]
pub struct RedisService {
    conn: ConnectionManager,
    remember_ttl_secs: u64,
}

impl RedisService {
    pub async fn connect(client: Client, remember_ttl_secs: u64) -> StoreResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, remember_ttl_secs })
    }

    async fn update_fields(&self, email: &str, fields: &[(&str, String)]) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = UPDATE_FIELDS.prepare_invoke();
        invocation.key(account_key(email));
        for (field, value) in fields {
            invocation.arg(*field).arg(value);
        }
        let updated: i32 = invocation.invoke_async(&mut conn).await?;
        Ok(updated == 1)
    }
}

#[async_trait]
impl AccountStore for RedisService {
    async fn insert(&self, account: &Account) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = INSERT_ACCOUNT.prepare_invoke();
        invocation
            .key(account_key(&account.email))
            .key(ACCOUNT_INDEX)
            .arg(&account.email);
        for (field, value) in account.to_fields() {
            invocation.arg(field).arg(value);
        }
        let inserted: i32 = invocation.invoke_async(&mut conn).await?;
        Ok(inserted == 1)
    }

    async fn get(&self, email: &str) -> StoreResult<Option<Account>> {
        let mut conn = self.conn.clone();
        let key = account_key(email);
        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Account::from_fields(fields)
            .map(Some)
            .map_err(|reason| StoreError::Corrupt { key, reason })
    }

    async fn list(&self) -> StoreResult<Vec<Account>> {
        let mut conn = self.conn.clone();
        let mut emails: Vec<String> = conn.smembers(ACCOUNT_INDEX).await?;
        emails.sort();

        let mut accounts = Vec::with_capacity(emails.len());
        for email in &emails {
            match self.get(email).await? {
                Some(account) => accounts.push(account),
                None => tracing::warn!("Account index lists {} but no record exists", email),
            }
        }
        Ok(accounts)
    }

    async fn set_approved(&self, email: &str, approved: bool) -> StoreResult<bool> {
        let flag = if approved { "1" } else { "0" };
        self.update_fields(email, &[("approved", flag.to_string())]).await
    }

    async fn set_quota(&self, email: &str, quota: Option<u32>) -> StoreResult<bool> {
        match quota {
            Some(quota) => self.update_fields(email, &[("quota", quota.to_string())]).await,
            None => {
                let mut conn = self.conn.clone();
                let cleared: i32 = CLEAR_FIELD
                    .key(account_key(email))
                    .arg("quota")
                    .invoke_async(&mut conn)
                    .await?;
                Ok(cleared == 1)
            }
        }
    }

    async fn reset_credentials(&self, email: &str, hash: &CredentialHash) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let reset: i32 = RESET_CREDENTIALS
            .key(account_key(email))
            .arg(hash.as_str())
            .arg(REMEMBER_PREFIX)
            .invoke_async(&mut conn)
            .await?;
        Ok(reset == 1)
    }

    async fn touch_last_login(&self, email: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        self.update_fields(email, &[("last_login", at.to_rfc3339())]).await
    }

    async fn set_remember_token(&self, email: &str, token: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let outcome: i32 = SET_REMEMBER_TOKEN
            .key(account_key(email))
            .key(remember_key(token))
            .arg(email)
            .arg(token)
            .arg(REMEMBER_PREFIX)
            .arg(self.remember_ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        match outcome {
            1 => Ok(true),
            0 => Ok(false),
            _ => Err(StoreError::TokenCollision),
        }
    }

    async fn clear_remember_token(&self, email: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i32 = CLEAR_REMEMBER_TOKEN
            .key(account_key(email))
            .arg(REMEMBER_PREFIX)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn find_by_remember_token(&self, token: &str) -> StoreResult<Option<Account>> {
        let mut conn = self.conn.clone();
        let email: Option<String> = conn.get(remember_key(token)).await?;
        let Some(email) = email else {
            return Ok(None);
        };
        // The index may briefly outlive a cleared token; the account record is authoritative
        Ok(self
            .get(&email)
            .await?
            .filter(|account| account.remember_token.as_deref() == Some(token)))
    }

    async fn decrement_quota(&self, email: &str) -> StoreResult<Option<u32>> {
        let mut conn = self.conn.clone();
        let remaining: i64 = DECREMENT_QUOTA
            .key(account_key(email))
            .invoke_async(&mut conn)
            .await?;
        match remaining {
            -2 => Err(StoreError::MissingAccount(email.to_string())),
            -1 => Ok(None),
            n => Ok(Some(n as u32)),
        }
    }
}
