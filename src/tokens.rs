use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims
///
/// Payload of both access and refresh tokens. Which kind a token is follows from the secret
/// that verifies it, never from a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the administrator id.
    pub sub: Uuid,
    /// JWT ID (jti): random per token, so two tokens minted in the same second still differ.
    pub jti: Uuid,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

/// TokenError
///
/// Verification failures are split so callers can tell an expired token from a forged one.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// TokenSigner
///
/// Mints and verifies HS256 tokens for one secret and one lifetime. The session layer owns two
/// of these: one for access tokens and one for refresh tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Ensure expiration time validation is always active, with no grace period.
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject: Uuid) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Mints a token as if it had been issued at `issued_at`.
    pub fn issue_at(&self, subject: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject,
            jti: Uuid::new_v4(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new("unit-test-secret", 60);
        let subject = Uuid::new_v4();

        let token = signer.issue(subject).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, subject);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_tokens_are_unique_within_the_same_instant() {
        let signer = TokenSigner::new("unit-test-secret", 60);
        let subject = Uuid::new_v4();
        let now = Utc::now();

        let first = signer.issue_at(subject, now).unwrap();
        let second = signer.issue_at(subject, now).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token_is_classified_as_expired() {
        let signer = TokenSigner::new("unit-test-secret", 60);
        let token = signer
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(1))
            .unwrap();

        assert!(matches!(signer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_foreign_secret_is_classified_as_invalid() {
        let signer = TokenSigner::new("unit-test-secret", 60);
        let other = TokenSigner::new("some-other-secret", 60);
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(signer.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_is_classified_as_invalid() {
        let signer = TokenSigner::new("unit-test-secret", 60);
        assert!(matches!(signer.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
    }
}
