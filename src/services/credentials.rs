use bcrypt::{hash, verify};

/// A salted, adaptive password hash. The plaintext is never retained.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Hashes `password` with bcrypt at the given cost.
    pub fn from_plaintext(password: &str, cost: u32) -> Result<Self, bcrypt::BcryptError> {
        hash(password.as_bytes(), cost).map(Self)
    }

    /// Wraps an already-encoded hash read back from storage.
    pub fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A malformed stored hash never verifies.
    pub fn verify(&self, password: &str) -> bool {
        match verify(password.as_bytes(), &self.0) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!("Password hash check failed: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}
