use std::collections::HashMap;
use chrono::{DateTime, Utc};
use crate::services::CredentialHash;

/// An authenticated account, identified by its email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password_hash: CredentialHash,
    pub quota: Option<u32>,     // None means unlimited
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub remember_token: Option<String>,
}

impl Account {
    pub fn new(email: String, password_hash: CredentialHash, quota: Option<u32>, approved: bool) -> Self {
        Self {
            email,
            password_hash,
            quota,
            approved,
            created_at: Utc::now(),
            last_login: None,
            remember_token: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.email.clone())
    }

    pub fn quota_exhausted(&self) -> bool {
        matches!(self.quota, Some(0))
    }

    /// Flattens the account into Redis hash field/value pairs. Absent optionals are omitted.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("email", self.email.clone()),
            ("password_hash", self.password_hash.as_str().to_string()),
            ("approved", if self.approved { "1" } else { "0" }.to_string()),
            ("created_at", self.created_at.to_rfc3339()),
        ];
        if let Some(quota) = self.quota {
            fields.push(("quota", quota.to_string()));
        }
        if let Some(last_login) = self.last_login {
            fields.push(("last_login", last_login.to_rfc3339()));
        }
        if let Some(token) = &self.remember_token {
            fields.push(("remember_token", token.clone()));
        }
        fields
    }

    /// Rebuilds an account from the fields of its Redis hash.
    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, String> {
        let mut take = |name: &str| fields.remove(name);

        let email = take("email").ok_or("missing email")?;
        let password_hash = take("password_hash")
            .map(CredentialHash::from_encoded)
            .ok_or("missing password_hash")?;
        let approved = match take("approved").as_deref() {
            Some("1") => true,
            Some("0") | None => false,
            Some(other) => return Err(format!("bad approved flag {:?}", other)),
        };
        let quota = take("quota")
            .map(|q| q.parse::<u32>().map_err(|e| format!("bad quota {:?}: {}", q, e)))
            .transpose()?;
        let created_at = take("created_at")
            .map(|t| parse_timestamp(&t))
            .transpose()?
            .ok_or("missing created_at")?;
        let last_login = take("last_login").map(|t| parse_timestamp(&t)).transpose()?;
        let remember_token = take("remember_token").filter(|t| !t.is_empty());

        Ok(Self {
            email,
            password_hash,
            quota,
            approved,
            created_at,
            last_login,
            remember_token,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {:?}: {}", value, e))
}
