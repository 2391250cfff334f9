use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    cookies::{ACCESS_TOKEN_COOKIE, bearer_token, read_cookie},
    error::AuthError,
    models::AdminProfile,
    session::SessionState,
};

/// AuthAdmin Extractor Result
///
/// The resolved identity of an authenticated request. Handlers receive this value instead of a
/// mutated request, and take the acting admin id from it.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub profile: AdminProfile,
}

impl AuthAdmin {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }
}

/// AuthAdmin Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthAdmin usable as a function argument
/// in any protected handler.
///
/// 0. Reuse: an `AuthAdmin` stored in the request extensions by `auth_middleware` is returned
///    as is, so a gated request hits the store once.
/// 1. Token Extraction: the `accessToken` cookie, falling back to `Authorization: Bearer`.
/// 2. Verification: delegated to `SessionAuthority::verify_access` (signature, expiry, live
///    and active identity).
///
/// Rejection: `AuthError::Unauthorized` carrying the precise reason, rendered as a 401 envelope.
impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the gate for this request.
        if let Some(admin) = parts.extensions.get::<AuthAdmin>() {
            return Ok(admin.clone());
        }

        let session = SessionState::from_ref(state);

        // The cookie wins when both are present.
        let token = read_cookie(&parts.headers, ACCESS_TOKEN_COOKIE)
            .or_else(|| bearer_token(&parts.headers));

        let profile = session.verify_access(token.as_deref()).await?;
        Ok(AuthAdmin { profile })
    }
}
