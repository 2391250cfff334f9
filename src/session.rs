use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cookies::{ACCESS_TOKEN_COOKIE, CookieSettings, REFRESH_TOKEN_COOKIE},
    error::{AuthError, AuthResult, UnauthorizedReason},
    hasher::HasherState,
    models::{AdminProfile, TokenPair},
    repository::RepositoryState,
    tokens::{TokenError, TokenSigner},
};

/// SessionConfig
///
/// Secrets, lifetimes and cookie attributes of the session layer. Built from `AppConfig` and
/// handed to `SessionAuthority::new`; nothing here is read from the environment directly.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub cookies: CookieSettings,
}

/// SessionState
///
/// The shared handle to the session authority, pulled from the application state via `FromRef`.
pub type SessionState = Arc<SessionAuthority>;

/// SessionAuthority
///
/// Issues, verifies and rotates the paired access/refresh tokens of administrators.
///
/// The persisted refresh token is the single source of truth for a session: a refresh token is
/// only exchangeable while it verifies AND equals the stored value. Rotation swaps the stored
/// value with compare-and-swap, so a replayed or concurrently reused token loses.
pub struct SessionAuthority {
    repo: RepositoryState,
    hasher: HasherState,
    access: TokenSigner,
    refresh: TokenSigner,
    cookies: CookieSettings,
}

impl SessionAuthority {
    pub fn new(config: SessionConfig, repo: RepositoryState, hasher: HasherState) -> Self {
        Self {
            access: TokenSigner::new(&config.access_token_secret, config.access_token_ttl_seconds),
            refresh: TokenSigner::new(
                &config.refresh_token_secret,
                config.refresh_token_ttl_seconds,
            ),
            cookies: config.cookies,
            repo,
            hasher,
        }
    }

    /// The signer for access tokens.
    pub fn access_signer(&self) -> &TokenSigner {
        &self.access
    }

    /// The signer for refresh tokens.
    pub fn refresh_signer(&self) -> &TokenSigner {
        &self.refresh
    }

    // --- Operations ---

    /// login
    ///
    /// Authenticates by username and password, mints a fresh pair and persists the refresh
    /// token, overwriting any previous session of the same admin. The write is conditional on
    /// the status and password digest that were checked.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> AuthResult<(AdminProfile, TokenPair)> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::bad_request("username and password are required"));
        }

        let admin = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;

        if !admin.is_active() {
            tracing::warn!(admin_id = %admin.id, "login rejected for inactive admin");
            return Err(AuthError::Unauthorized(UnauthorizedReason::AccountInactive));
        }

        if !self.hasher.verify(password, &admin.password_hash).await? {
            tracing::warn!(admin_id = %admin.id, "login rejected: wrong password");
            return Err(AuthError::Unauthorized(UnauthorizedReason::InvalidCredentials));
        }

        let pair = self.mint_pair(admin.id)?;
        let issued = self
            .repo
            .issue_refresh_token(admin.id, &admin.password_hash, &pair.refresh_token)
            .await?;
        if !issued {
            // The record changed after it was read: removed, deactivated or re-keyed.
            let reason = match self.repo.find_by_id(admin.id).await? {
                None => return Err(AuthError::not_found("admin not found")),
                Some(current) if !current.is_active() => UnauthorizedReason::AccountInactive,
                Some(_) => UnauthorizedReason::InvalidCredentials,
            };
            tracing::warn!(admin_id = %admin.id, ?reason, "login lost race with account change");
            return Err(AuthError::Unauthorized(reason));
        }

        tracing::info!(admin_id = %admin.id, "admin logged in");
        Ok((AdminProfile::from(admin), pair))
    }

    /// verify_access
    ///
    /// The gate in front of every protected operation. Never mutates state.
    pub async fn verify_access(&self, token: Option<&str>) -> AuthResult<AdminProfile> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized(UnauthorizedReason::MissingToken))?;

        let claims = self.access.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::Unauthorized(UnauthorizedReason::AccessTokenExpired),
            _ => AuthError::Unauthorized(UnauthorizedReason::InvalidToken),
        })?;

        let admin = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized(UnauthorizedReason::InvalidToken))?;

        if !admin.is_active() {
            return Err(AuthError::Unauthorized(UnauthorizedReason::AccountInactive));
        }

        Ok(AdminProfile::from(admin))
    }

    /// refresh
    ///
    /// Exchanges the current refresh token for a new pair. The presented token is consumed:
    /// presenting it again, even while it still verifies, fails with `RefreshTokenReused`.
    pub async fn refresh(&self, incoming: Option<&str>) -> AuthResult<TokenPair> {
        let incoming = incoming
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthorized(UnauthorizedReason::MissingToken))?;

        let claims = self
            .refresh
            .verify(incoming)
            .map_err(|_| AuthError::Unauthorized(UnauthorizedReason::InvalidToken))?;

        let admin = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized(UnauthorizedReason::InvalidRefreshToken))?;

        if !admin.is_active() {
            return Err(AuthError::Unauthorized(UnauthorizedReason::AccountInactive));
        }

        if admin.refresh_token.as_deref() != Some(incoming) {
            tracing::warn!(admin_id = %admin.id, "refresh token reuse detected");
            return Err(AuthError::Unauthorized(UnauthorizedReason::RefreshTokenReused));
        }

        let pair = self.mint_pair(admin.id)?;
        let swapped = self
            .repo
            .rotate_refresh_token(admin.id, incoming, &pair.refresh_token)
            .await?;
        if !swapped {
            tracing::warn!(admin_id = %admin.id, "refresh lost rotation race");
            return Err(AuthError::Unauthorized(UnauthorizedReason::RefreshTokenReused));
        }

        tracing::info!(admin_id = %admin.id, "session refreshed");
        Ok(pair)
    }

    /// logout
    ///
    /// Unsets the stored refresh token. Logging out twice, or logging out an admin that no
    /// longer exists, is not an error.
    pub async fn logout(&self, admin_id: Uuid) -> AuthResult<()> {
        self.repo.set_refresh_token(admin_id, None).await?;
        tracing::info!(admin_id = %admin_id, "admin logged out");
        Ok(())
    }

    // --- Cookies ---

    /// Set-Cookie headers delivering `pair`, each living as long as its token.
    pub fn session_cookies(&self, pair: &TokenPair) -> AuthResult<HeaderMap> {
        let access = self.cookies.session_cookie(
            ACCESS_TOKEN_COOKIE,
            &pair.access_token,
            self.access.ttl_seconds(),
        );
        let refresh = self.cookies.session_cookie(
            REFRESH_TOKEN_COOKIE,
            &pair.refresh_token,
            self.refresh.ttl_seconds(),
        );
        cookie_headers(access, refresh)
    }

    /// Set-Cookie headers removing both session cookies.
    pub fn cleared_cookies(&self) -> AuthResult<HeaderMap> {
        cookie_headers(
            self.cookies.cleared_cookie(ACCESS_TOKEN_COOKIE),
            self.cookies.cleared_cookie(REFRESH_TOKEN_COOKIE),
        )
    }

    fn mint_pair(&self, admin_id: Uuid) -> AuthResult<TokenPair> {
        let access_token = self.access.issue(admin_id).map_err(token_failure)?;
        let refresh_token = self.refresh.issue(admin_id).map_err(token_failure)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn token_failure(err: TokenError) -> AuthError {
    AuthError::Internal(err.to_string())
}

fn cookie_headers<E: std::fmt::Display>(
    access: Result<HeaderValue, E>,
    refresh: Result<HeaderValue, E>,
) -> AuthResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for cookie in [access, refresh] {
        let value = cookie.map_err(|e| AuthError::Internal(format!("invalid cookie: {e}")))?;
        headers.append(SET_COOKIE, value);
    }
    Ok(headers)
}
