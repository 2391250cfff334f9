use crate::models::{Admin, AdminDetails, AdminStatus, NewAdmin};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepositoryError
///
/// Failures of the administrator store. A uniqueness violation is reported separately so it can
/// surface as a conflict rather than an internal error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// AdminRepository Trait
///
/// The abstract contract for administrator persistence. The session layer depends only on this
/// trait, so Postgres and the in-memory store are interchangeable.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn AdminRepository>` across
/// Axum's task boundaries.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    // --- Lookup ---
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Admin>>;
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Admin>>;
    // Newest first.
    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>>;
    async fn count_admins(&self) -> RepositoryResult<i64>;
    /// True when another admin (other than `exclude`) already holds `username` or `email`.
    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<bool>;

    // --- Session state ---
    /// Unconditionally overwrites (or with `None`, unsets) the stored refresh token.
    /// Returns false when the admin does not exist.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<bool>;
    /// Stores the refresh token of a fresh login, but only while the admin is still active and
    /// still has the password digest the login was checked against. Returns false otherwise.
    async fn issue_refresh_token(
        &self,
        id: Uuid,
        expected_password_hash: &str,
        token: &str,
    ) -> RepositoryResult<bool>;
    /// Compare-and-swap: replaces the stored refresh token with `next` only if it still equals
    /// `current`. Returns false when another request rotated or cleared it first.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> RepositoryResult<bool>;

    // --- Administration ---
    async fn create_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin>;
    async fn update_details(
        &self,
        id: Uuid,
        details: AdminDetails,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>>;
    /// Replaces the credential digest and revokes the stored refresh token.
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        actor: Uuid,
    ) -> RepositoryResult<bool>;
    /// Deactivation also revokes the stored refresh token and records `deleted_by`.
    async fn set_status(
        &self,
        id: Uuid,
        status: AdminStatus,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>>;
    async fn set_verified(
        &self,
        id: Uuid,
        verified: bool,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn AdminRepository>;

const ADMIN_COLUMNS: &str = "id, name, username, email, phone_number, profile, password_hash, \
     refresh_token, status, verified, created_by, updated_by, deleted_by, created_at, updated_at";

/// PostgresRepository
///
/// The concrete implementation backed by PostgreSQL. Schema: `migrations/0001_create_admins.sql`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict("admin with this username or email already exists".into())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl AdminRepository for PostgresRepository {
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC");
        let admins = sqlx::query_as::<_, Admin>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(admins)
    }

    async fn count_admins(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (
                SELECT 1 FROM admins
                WHERE (username = $1 OR email = $2)
                  AND ($3::uuid IS NULL OR id <> $3)
            )"#,
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<bool> {
        let result = sqlx::query("UPDATE admins SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// issue_refresh_token
    ///
    /// A deactivation or password change committed after the login read makes the predicate
    /// miss, so no session outlives it.
    async fn issue_refresh_token(
        &self,
        id: Uuid,
        expected_password_hash: &str,
        token: &str,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE admins SET refresh_token = $3 \
             WHERE id = $1 AND password_hash = $2 AND status = 'active'",
        )
        .bind(id)
        .bind(expected_password_hash)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// rotate_refresh_token
    ///
    /// The `refresh_token = $2` predicate makes the swap atomic: of two requests racing on the
    /// same stale value, only the first UPDATE matches a row.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE admins SET refresh_token = $3 WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin> {
        let sql = format!(
            "INSERT INTO admins (id, name, username, email, phone_number, profile, password_hash, \
             status, verified, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', false, $8, NOW(), NOW()) \
             RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(Uuid::new_v4())
            .bind(&admin.name)
            .bind(&admin.username)
            .bind(&admin.email)
            .bind(&admin.phone_number)
            .bind(&admin.profile)
            .bind(&admin.password_hash)
            .bind(admin.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: AdminDetails,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        let sql = format!(
            "UPDATE admins SET name = $2, username = $3, email = $4, phone_number = $5, \
             updated_by = $6, updated_at = NOW() WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .bind(&details.name)
            .bind(&details.username)
            .bind(&details.email)
            .bind(&details.phone_number)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        actor: Uuid,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE admins SET password_hash = $2, refresh_token = NULL, updated_by = $3, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(actor)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AdminStatus,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        // Inactive: record the actor as deleter and revoke the session.
        // Active: clear the deleter and leave session state untouched.
        let sql = format!(
            "UPDATE admins SET status = $2, updated_by = $3, updated_at = NOW(), \
             deleted_by = CASE WHEN $2 = 'inactive'::admin_status THEN $3 ELSE NULL END, \
             refresh_token = CASE WHEN $2 = 'inactive'::admin_status THEN NULL ELSE refresh_token END \
             WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        );
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .bind(status)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn set_verified(
        &self,
        id: Uuid,
        verified: bool,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        let sql = format!(
            "UPDATE admins SET verified = $2, updated_by = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        );
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .bind(verified)
            .bind(actor)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }
}

/// InMemoryRepository
///
/// A lock-guarded map implementing the same contract, including compare-and-swap rotation.
/// Used by the test suites and for running the service without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    admins: RwLock<HashMap<Uuid, Admin>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(admins: &HashMap<Uuid, Admin>, username: &str, email: &str, exclude: Option<Uuid>) -> bool {
        admins
            .values()
            .filter(|a| Some(a.id) != exclude)
            .any(|a| a.username == username || a.email == email)
    }
}

#[async_trait]
impl AdminRepository for InMemoryRepository {
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Admin>> {
        let admins = self.admins.read().await;
        Ok(admins.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Admin>> {
        Ok(self.admins.read().await.get(&id).cloned())
    }

    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>> {
        let mut admins: Vec<Admin> = self.admins.read().await.values().cloned().collect();
        admins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(admins)
    }

    async fn count_admins(&self) -> RepositoryResult<i64> {
        Ok(self.admins.read().await.len() as i64)
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        exclude: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        let admins = self.admins.read().await;
        Ok(Self::taken(&admins, username, email, exclude))
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> RepositoryResult<bool> {
        let mut admins = self.admins.write().await;
        match admins.get_mut(&id) {
            Some(admin) => {
                admin.refresh_token = token.map(str::to_owned);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn issue_refresh_token(
        &self,
        id: Uuid,
        expected_password_hash: &str,
        token: &str,
    ) -> RepositoryResult<bool> {
        let mut admins = self.admins.write().await;
        match admins.get_mut(&id) {
            Some(admin) if admin.is_active() && admin.password_hash == expected_password_hash => {
                admin.refresh_token = Some(token.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
    ) -> RepositoryResult<bool> {
        let mut admins = self.admins.write().await;
        match admins.get_mut(&id) {
            Some(admin) if admin.refresh_token.as_deref() == Some(current) => {
                admin.refresh_token = Some(next.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin> {
        let mut admins = self.admins.write().await;
        if Self::taken(&admins, &admin.username, &admin.email, None) {
            return Err(RepositoryError::Conflict(
                "admin with this username or email already exists".into(),
            ));
        }

        let now = Utc::now();
        let record = Admin {
            id: Uuid::new_v4(),
            name: admin.name,
            username: admin.username,
            email: admin.email,
            phone_number: admin.phone_number,
            profile: admin.profile,
            password_hash: admin.password_hash,
            refresh_token: None,
            status: AdminStatus::Active,
            verified: false,
            created_by: admin.created_by,
            updated_by: None,
            deleted_by: None,
            created_at: now,
            updated_at: now,
        };
        admins.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: AdminDetails,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        let mut admins = self.admins.write().await;
        if Self::taken(&admins, &details.username, &details.email, Some(id)) {
            return Err(RepositoryError::Conflict(
                "admin with this username or email already exists".into(),
            ));
        }
        Ok(admins.get_mut(&id).map(|admin| {
            admin.name = details.name;
            admin.username = details.username;
            admin.email = details.email;
            admin.phone_number = details.phone_number;
            admin.updated_by = Some(actor);
            admin.updated_at = Utc::now();
            admin.clone()
        }))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        actor: Uuid,
    ) -> RepositoryResult<bool> {
        let mut admins = self.admins.write().await;
        match admins.get_mut(&id) {
            Some(admin) => {
                admin.password_hash = password_hash.to_owned();
                admin.refresh_token = None;
                admin.updated_by = Some(actor);
                admin.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AdminStatus,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        let mut admins = self.admins.write().await;
        Ok(admins.get_mut(&id).map(|admin| {
            admin.status = status;
            admin.updated_by = Some(actor);
            admin.updated_at = Utc::now();
            match status {
                AdminStatus::Inactive => {
                    admin.deleted_by = Some(actor);
                    admin.refresh_token = None;
                }
                AdminStatus::Active => admin.deleted_by = None,
            }
            admin.clone()
        }))
    }

    async fn set_verified(
        &self,
        id: Uuid,
        verified: bool,
        actor: Uuid,
    ) -> RepositoryResult<Option<Admin>> {
        let mut admins = self.admins.write().await;
        Ok(admins.get_mut(&id).map(|admin| {
            admin.verified = verified;
            admin.updated_by = Some(actor);
            admin.updated_at = Utc::now();
            admin.clone()
        }))
    }
}
