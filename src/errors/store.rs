use thiserror::Error;
use redis::RedisError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Corrupt account record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Account {0} does not exist")]
    MissingAccount(String),

    #[error("Remember token already in use")]
    TokenCollision,
}

pub type StoreResult<T> = Result<T, StoreError>;
