//! Session cookie construction and request credential extraction.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// CookieSettings
///
/// Attributes applied to both session cookies. `http_only` and `secure` default to on.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
    pub same_site: &'static str,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            path: "/".to_string(),
            same_site: "Lax",
        }
    }
}

impl CookieSettings {
    /// Builds a `Set-Cookie` value carrying `value` for `max_age_seconds`.
    pub fn session_cookie(
        &self,
        name: &str,
        value: &str,
        max_age_seconds: i64,
    ) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.render(name, value, max_age_seconds))
    }

    /// Builds a `Set-Cookie` value that makes the browser drop `name` immediately.
    pub fn cleared_cookie(&self, name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&self.render(name, "", 0))
    }

    fn render(&self, name: &str, value: &str, max_age_seconds: i64) -> String {
        let mut cookie = format!(
            "{name}={value}; Path={}; SameSite={}; Max-Age={max_age_seconds}",
            self.path, self.same_site
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Returns the value of cookie `name` from the request, ignoring empty values.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
