use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminStatus
///
/// Activation state of an administrator. Deactivation is a soft state change; records are
/// never hard-deleted through the auth path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default)]
#[sqlx(type_name = "admin_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AdminStatus {
    #[default]
    Active,
    Inactive,
}

/// Admin
///
/// The canonical administrator record stored in the `admins` table. Contains the credential
/// digest and the single outstanding refresh token, so it must never be serialized to clients;
/// convert to `AdminProfile` first.
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Option<String>,
    pub password_hash: String,
    // Absent means logged out.
    pub refresh_token: Option<String>,
    pub status: AdminStatus,
    pub verified: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

/// AdminProfile
///
/// Public projection of an administrator: everything except `password_hash` and
/// `refresh_token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Option<String>,
    pub status: AdminStatus,
    pub verified: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminProfile {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            username: admin.username,
            email: admin.email,
            phone_number: admin.phone_number,
            profile: admin.profile,
            status: admin.status,
            verified: admin.verified,
            created_by: admin.created_by,
            updated_by: admin.updated_by,
            deleted_by: admin.deleted_by,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

/// NewAdmin
///
/// Fully prepared insert for the repository: the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Option<String>,
    pub password_hash: String,
    pub created_by: Option<Uuid>,
}

/// AdminDetails
///
/// The mutable contact fields of an administrator.
#[derive(Debug, Clone)]
pub struct AdminDetails {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /api/admin/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// RefreshTokenRequest
///
/// Optional body for POST /api/admin/refresh-token, for clients that do not keep cookies.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// RegisterAdminRequest
///
/// Input payload for POST /api/admin/register. `profile` is a URL already hosted elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterAdminRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
    pub profile: Option<String>,
}

/// UpdateAdminDetailsRequest
///
/// Input payload for PUT /api/admin/details.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAdminDetailsRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
}

/// ChangePasswordRequest
///
/// Input payload for PUT /api/admin/password.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// VerificationRequest
///
/// Input payload for PUT /api/admin/admins/{id}/verification. `verified` is required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VerificationRequest {
    pub verified: Option<bool>,
}

// --- Response Payloads (Output Schemas) ---

/// TokenPair
///
/// A freshly minted session. Also delivered as `accessToken`/`refreshToken` cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// LoginResponse
///
/// Body of a successful login: the public profile and both tokens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub admin: AdminProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// ApiResponse
///
/// Success envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, Some(data), message)
    }
}
