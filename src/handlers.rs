use crate::{
    AppState,
    auth::AuthAdmin,
    cookies::{REFRESH_TOKEN_COOKIE, bearer_token, read_cookie},
    error::{AuthError, ErrorEnvelope},
    models::{
        AdminProfile, ApiResponse, ChangePasswordRequest, LoginRequest, LoginResponse,
        RefreshTokenRequest, RegisterAdminRequest, TokenPair, UpdateAdminDetailsRequest,
        VerificationRequest,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use uuid::Uuid;

/// Every handler answers with the status, optional Set-Cookie headers and the success envelope.
type Reply<T> = Result<(StatusCode, HeaderMap, Json<ApiResponse<T>>), AuthError>;

fn reply<T>(status: StatusCode, headers: HeaderMap, data: Option<T>, message: &str) -> Reply<T> {
    Ok((
        status,
        headers,
        Json(ApiResponse::new(status.as_u16(), data, message)),
    ))
}

// --- Session Handlers ---

/// login
///
/// [Public Route] Exchanges username and password for a session. Both tokens are set as
/// HttpOnly cookies and also returned in the body for clients without a cookie jar.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorEnvelope),
        (status = 401, description = "Wrong password or inactive admin", body = ErrorEnvelope),
        (status = 404, description = "Unknown username", body = ErrorEnvelope)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Reply<LoginResponse> {
    let (admin, pair) = state
        .session
        .login(&payload.username, &payload.password)
        .await?;
    let cookies = state.session.session_cookies(&pair)?;

    let body = LoginResponse {
        admin,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    reply(StatusCode::OK, cookies, Some(body), "admin logged in successfully")
}

/// refresh_token
///
/// [Public Route] Rotates the session. The refresh token is read from the `refreshToken`
/// cookie, then the JSON body, then the bearer header. The body is optional and a malformed
/// one is treated as absent.
#[utoipa::path(
    post,
    path = "/api/admin/refresh-token",
    request_body(content = RefreshTokenRequest, description = "Optional when the refreshToken cookie is sent"),
    responses(
        (status = 200, description = "Session rotated", body = TokenPair),
        (status = 401, description = "Missing, invalid or reused refresh token", body = ErrorEnvelope)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Reply<TokenPair> {
    let from_body = || {
        serde_json::from_slice::<RefreshTokenRequest>(&body)
            .ok()
            .and_then(|req| req.refresh_token)
            .filter(|token| !token.trim().is_empty())
    };
    let incoming = read_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(from_body)
        .or_else(|| bearer_token(&headers));

    let pair = state.session.refresh(incoming.as_deref()).await?;
    let cookies = state.session.session_cookies(&pair)?;
    reply(StatusCode::OK, cookies, Some(pair), "access token refreshed")
}

/// logout
///
/// [Authenticated Route] Ends the session of the requesting admin and clears both cookies.
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope)
    )
)]
pub async fn logout(admin: AuthAdmin, State(state): State<AppState>) -> Reply<()> {
    state.session.logout(admin.id()).await?;
    let cookies = state.session.cleared_cookies()?;
    reply(StatusCode::OK, cookies, None, "admin logged out")
}

/// get_me
///
/// [Authenticated Route] Returns the profile resolved by the gate.
#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Current admin", body = AdminProfile),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope)
    )
)]
pub async fn get_me(admin: AuthAdmin) -> Reply<AdminProfile> {
    reply(
        StatusCode::OK,
        HeaderMap::new(),
        Some(admin.profile),
        "current admin fetched",
    )
}

// --- Administrator Management Handlers ---

/// register_admin
///
/// [Authenticated Route] Creates another administrator. The requester is recorded as creator.
#[utoipa::path(
    post,
    path = "/api/admin/register",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = AdminProfile),
        (status = 400, description = "Missing fields", body = ErrorEnvelope),
        (status = 409, description = "Username or email taken", body = ErrorEnvelope)
    )
)]
pub async fn register_admin(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Json(payload): Json<RegisterAdminRequest>,
) -> Reply<AdminProfile> {
    let created = state.admins.register(admin.id(), payload).await?;
    reply(
        StatusCode::CREATED,
        HeaderMap::new(),
        Some(created),
        "admin registered successfully",
    )
}

#[utoipa::path(
    get,
    path = "/api/admin/admins",
    responses((status = 200, description = "All admins, newest first", body = [AdminProfile]))
)]
pub async fn list_admins(State(state): State<AppState>) -> Reply<Vec<AdminProfile>> {
    let admins = state.admins.list().await?;
    reply(StatusCode::OK, HeaderMap::new(), Some(admins), "admins fetched")
}

/// update_details
///
/// [Authenticated Route] Updates the requester's own contact details.
#[utoipa::path(
    put,
    path = "/api/admin/details",
    request_body = UpdateAdminDetailsRequest,
    responses(
        (status = 200, description = "Details updated", body = AdminProfile),
        (status = 409, description = "Username or email taken", body = ErrorEnvelope)
    )
)]
pub async fn update_details(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Json(payload): Json<UpdateAdminDetailsRequest>,
) -> Reply<AdminProfile> {
    let updated = state.admins.update_details(admin.id(), payload).await?;
    reply(StatusCode::OK, HeaderMap::new(), Some(updated), "admin details updated")
}

/// change_password
///
/// [Authenticated Route] Changes the requester's password. All sessions are revoked, so the
/// cookies are cleared and the admin must log in again.
#[utoipa::path(
    put,
    path = "/api/admin/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed, session ended"),
        (status = 401, description = "Current password is wrong", body = ErrorEnvelope)
    )
)]
pub async fn change_password(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Reply<()> {
    state.admins.change_password(admin.id(), payload).await?;
    let cookies = state.session.cleared_cookies()?;
    reply(StatusCode::OK, cookies, None, "password changed, please log in again")
}

#[utoipa::path(
    put,
    path = "/api/admin/admins/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Admin deactivated", body = AdminProfile),
        (status = 400, description = "Cannot deactivate yourself", body = ErrorEnvelope),
        (status = 404, description = "Unknown admin", body = ErrorEnvelope)
    )
)]
pub async fn deactivate_admin(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Reply<AdminProfile> {
    let updated = state.admins.deactivate(admin.id(), id).await?;
    reply(StatusCode::OK, HeaderMap::new(), Some(updated), "admin deactivated")
}

#[utoipa::path(
    put,
    path = "/api/admin/admins/{id}/activate",
    params(("id" = Uuid, Path, description = "Admin id")),
    responses(
        (status = 200, description = "Admin activated", body = AdminProfile),
        (status = 404, description = "Unknown admin", body = ErrorEnvelope)
    )
)]
pub async fn activate_admin(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Reply<AdminProfile> {
    let updated = state.admins.activate(admin.id(), id).await?;
    reply(StatusCode::OK, HeaderMap::new(), Some(updated), "admin activated")
}

/// set_verification
///
/// [Authenticated Route] Marks another admin as verified or unverified.
#[utoipa::path(
    put,
    path = "/api/admin/admins/{id}/verification",
    params(("id" = Uuid, Path, description = "Admin id")),
    request_body = VerificationRequest,
    responses(
        (status = 200, description = "Verification updated", body = AdminProfile),
        (status = 400, description = "verified is missing", body = ErrorEnvelope),
        (status = 404, description = "Unknown admin", body = ErrorEnvelope)
    )
)]
pub async fn set_verification(
    admin: AuthAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerificationRequest>,
) -> Reply<AdminProfile> {
    let updated = state
        .admins
        .set_verification(admin.id(), id, payload.verified)
        .await?;
    reply(
        StatusCode::OK,
        HeaderMap::new(),
        Some(updated),
        "admin verification updated",
    )
}
