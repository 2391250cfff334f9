use uuid::Uuid;

use crate::{
    config::BootstrapAdmin,
    error::{AuthError, AuthResult, UnauthorizedReason},
    hasher::HasherState,
    models::{
        AdminDetails, AdminProfile, AdminStatus, ChangePasswordRequest, NewAdmin,
        RegisterAdminRequest, UpdateAdminDetailsRequest,
    },
    repository::RepositoryState,
};

/// AdminService
///
/// Administrator management on behalf of an authenticated actor. The actor id always comes from
/// the `AuthAdmin` context, never from the request body.
#[derive(Clone)]
pub struct AdminService {
    repo: RepositoryState,
    hasher: HasherState,
}

impl AdminService {
    pub fn new(repo: RepositoryState, hasher: HasherState) -> Self {
        Self { repo, hasher }
    }

    /// register
    ///
    /// Creates a new active, unverified admin with `created_by` set to the actor.
    pub async fn register(
        &self,
        actor: Uuid,
        payload: RegisterAdminRequest,
    ) -> AuthResult<AdminProfile> {
        require(&[
            ("name", &payload.name),
            ("username", &payload.username),
            ("email", &payload.email),
            ("password", &payload.password),
            ("phoneNumber", &payload.phone_number),
        ])?;

        let username = payload.username.trim().to_string();
        let email = payload.email.trim().to_lowercase();
        if self.repo.identity_taken(&username, &email, None).await? {
            return Err(AuthError::conflict(
                "admin with this username or email already exists",
            ));
        }

        let password_hash = self.hasher.hash(&payload.password).await?;
        let admin = self
            .repo
            .create_admin(NewAdmin {
                name: payload.name.trim().to_string(),
                username,
                email,
                phone_number: payload.phone_number.trim().to_string(),
                profile: payload.profile.filter(|p| !p.trim().is_empty()),
                password_hash,
                created_by: Some(actor),
            })
            .await?;

        tracing::info!(admin_id = %admin.id, created_by = %actor, "admin registered");
        Ok(admin.into())
    }

    /// Every admin, newest first.
    pub async fn list(&self) -> AuthResult<Vec<AdminProfile>> {
        let admins = self.repo.list_admins().await?;
        Ok(admins.into_iter().map(AdminProfile::from).collect())
    }

    pub async fn update_details(
        &self,
        actor: Uuid,
        payload: UpdateAdminDetailsRequest,
    ) -> AuthResult<AdminProfile> {
        require(&[
            ("name", &payload.name),
            ("username", &payload.username),
            ("email", &payload.email),
            ("phoneNumber", &payload.phone_number),
        ])?;

        let details = AdminDetails {
            name: payload.name.trim().to_string(),
            username: payload.username.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            phone_number: payload.phone_number.trim().to_string(),
        };
        if self
            .repo
            .identity_taken(&details.username, &details.email, Some(actor))
            .await?
        {
            return Err(AuthError::conflict(
                "admin with this username or email already exists",
            ));
        }

        let admin = self
            .repo
            .update_details(actor, details, actor)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;
        Ok(admin.into())
    }

    /// change_password
    ///
    /// Replaces the actor's password after checking the current one. The stored refresh token
    /// is revoked in the same write, ending every outstanding session.
    pub async fn change_password(
        &self,
        actor: Uuid,
        payload: ChangePasswordRequest,
    ) -> AuthResult<()> {
        require(&[
            ("currentPassword", &payload.current_password),
            ("newPassword", &payload.new_password),
        ])?;

        let admin = self
            .repo
            .find_by_id(actor)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;

        if !self
            .hasher
            .verify(&payload.current_password, &admin.password_hash)
            .await?
        {
            return Err(AuthError::Unauthorized(UnauthorizedReason::InvalidCredentials));
        }

        let password_hash = self.hasher.hash(&payload.new_password).await?;
        if !self.repo.update_password(actor, &password_hash, actor).await? {
            return Err(AuthError::not_found("admin not found"));
        }

        tracing::info!(admin_id = %actor, "password changed, sessions revoked");
        Ok(())
    }

    pub async fn deactivate(&self, actor: Uuid, admin_id: Uuid) -> AuthResult<AdminProfile> {
        if actor == admin_id {
            return Err(AuthError::bad_request("you cannot deactivate your own account"));
        }

        let admin = self
            .repo
            .set_status(admin_id, AdminStatus::Inactive, actor)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;

        tracing::info!(admin_id = %admin_id, deactivated_by = %actor, "admin deactivated");
        Ok(admin.into())
    }

    pub async fn activate(&self, actor: Uuid, admin_id: Uuid) -> AuthResult<AdminProfile> {
        let admin = self
            .repo
            .set_status(admin_id, AdminStatus::Active, actor)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;

        tracing::info!(admin_id = %admin_id, activated_by = %actor, "admin activated");
        Ok(admin.into())
    }

    pub async fn set_verification(
        &self,
        actor: Uuid,
        admin_id: Uuid,
        verified: Option<bool>,
    ) -> AuthResult<AdminProfile> {
        let verified = verified.ok_or_else(|| AuthError::bad_request("verified is required"))?;

        let admin = self
            .repo
            .set_verified(admin_id, verified, actor)
            .await?
            .ok_or_else(|| AuthError::not_found("admin not found"))?;
        Ok(admin.into())
    }

    /// bootstrap
    ///
    /// Creates the first administrator when the store is empty. Returns `None` when admins
    /// already exist, so running it on every startup is harmless.
    pub async fn bootstrap(&self, seed: &BootstrapAdmin) -> AuthResult<Option<AdminProfile>> {
        if self.repo.count_admins().await? > 0 {
            return Ok(None);
        }
        require(&[
            ("BOOTSTRAP_ADMIN_USERNAME", &seed.username),
            ("BOOTSTRAP_ADMIN_EMAIL", &seed.email),
            ("BOOTSTRAP_ADMIN_PASSWORD", &seed.password),
        ])?;

        let password_hash = self.hasher.hash(&seed.password).await?;
        let admin = self
            .repo
            .create_admin(NewAdmin {
                name: seed.username.trim().to_string(),
                username: seed.username.trim().to_string(),
                email: seed.email.trim().to_lowercase(),
                phone_number: String::new(),
                profile: None,
                password_hash,
                created_by: None,
            })
            .await?;

        tracing::info!(admin_id = %admin.id, "bootstrap admin created");
        Ok(Some(admin.into()))
    }
}

fn require(fields: &[(&str, &String)]) -> AuthResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AuthError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
