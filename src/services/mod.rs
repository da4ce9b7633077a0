mod account_service;
mod account_store;
mod credentials;
#[cfg(test)]
mod memory_store;
mod redis_service;

pub use account_service::{parse_quota, AccountService};
pub use account_store::AccountStore;
pub use credentials::CredentialHash;
#[cfg(test)]
pub use memory_store::{FlakyAccountStore, MemoryAccountStore};
pub use redis_service::RedisService;
