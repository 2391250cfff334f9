use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// HashError
///
/// A failure of the hashing primitive itself (malformed digest, worker panic), as opposed to
/// a password simply not matching.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// CredentialHasher
///
/// The password-hashing collaborator of the session layer. Implementations must compare in
/// constant time.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produces a self-describing digest (salt and cost embedded) for storage.
    async fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// Returns `Ok(false)` on mismatch; `Err` only when the digest cannot be checked at all.
    async fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError>;
}

/// BcryptHasher
///
/// Both operations run on the blocking pool, off the request's worker thread.
#[derive(Clone, Debug)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl CredentialHasher for BcryptHasher {
    async fn hash(&self, secret: &str) -> Result<String, HashError> {
        let secret = secret.to_owned();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost)).await??;
        Ok(digest)
    }

    async fn verify(&self, secret: &str, digest: &str) -> Result<bool, HashError> {
        let secret = secret.to_owned();
        let digest = digest.to_owned();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(secret, &digest)).await??;
        Ok(matches)
    }
}

/// HasherState
///
/// The shared handle to the hashing collaborator.
pub type HasherState = Arc<dyn CredentialHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hasher = BcryptHasher::new(4);
        let digest = hasher.hash("s3cret-pass").await.unwrap();

        assert_ne!(digest, "s3cret-pass");
        assert!(hasher.verify("s3cret-pass", &digest).await.unwrap());
        assert!(!hasher.verify("wrong-pass", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_digest() {
        let hasher = BcryptHasher::new(4);
        assert!(hasher.verify("anything", "not-a-bcrypt-digest").await.is_err());
    }
}
