use campus_admin::{
    AdminService, AuthError, UnauthorizedReason,
    config::{AppConfig, BootstrapAdmin},
    hasher::{BcryptHasher, HasherState},
    models::{
        AdminStatus, ChangePasswordRequest, RegisterAdminRequest, UpdateAdminDetailsRequest,
    },
    repository::{AdminRepository, InMemoryRepository, RepositoryState},
    session::SessionAuthority,
};
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (Arc<InMemoryRepository>, AdminService, SessionAuthority) {
    let repo = Arc::new(InMemoryRepository::new());
    let hasher = Arc::new(BcryptHasher::new(4)) as HasherState;
    let admins = AdminService::new(repo.clone() as RepositoryState, hasher.clone());
    let session = SessionAuthority::new(
        AppConfig::default().session(),
        repo.clone() as RepositoryState,
        hasher,
    );
    (repo, admins, session)
}

fn register_request(username: &str) -> RegisterAdminRequest {
    RegisterAdminRequest {
        name: "Jane Registrar".to_string(),
        username: username.to_string(),
        email: format!("{username}@campus.test"),
        password: "initial-pass".to_string(),
        phone_number: "0711111111".to_string(),
        profile: None,
    }
}

async fn bootstrap_root(admins: &AdminService) -> Uuid {
    admins
        .bootstrap(&BootstrapAdmin {
            username: "root".to_string(),
            email: "root@campus.test".to_string(),
            password: "root-password".to_string(),
        })
        .await
        .unwrap()
        .expect("store was empty")
        .id
}

// --- Bootstrap ---

#[tokio::test]
async fn test_bootstrap_runs_only_on_empty_store() {
    let (_, admins, session) = setup();
    let seed = BootstrapAdmin {
        username: "root".to_string(),
        email: "Root@Campus.test".to_string(),
        password: "root-password".to_string(),
    };

    let created = admins.bootstrap(&seed).await.unwrap().unwrap();
    assert_eq!(created.created_by, None);
    assert_eq!(created.email, "root@campus.test");
    assert_eq!(created.status, AdminStatus::Active);

    assert!(admins.bootstrap(&seed).await.unwrap().is_none());
    assert!(session.login("root", "root-password").await.is_ok());
}

// --- Register ---

#[tokio::test]
async fn test_register_records_creator() {
    let (_, admins, session) = setup();
    let root = bootstrap_root(&admins).await;

    let created = admins.register(root, register_request("jane")).await.unwrap();

    assert_eq!(created.created_by, Some(root));
    assert_eq!(created.status, AdminStatus::Active);
    assert!(!created.verified);
    assert!(session.login("jane", "initial-pass").await.is_ok());
}

#[tokio::test]
async fn test_register_duplicate_username_or_email_conflicts() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;
    admins.register(root, register_request("jane")).await.unwrap();

    let same_username = RegisterAdminRequest {
        email: "other@campus.test".to_string(),
        ..register_request("jane")
    };
    assert!(matches!(
        admins.register(root, same_username).await,
        Err(AuthError::Conflict(_))
    ));

    let same_email = RegisterAdminRequest {
        email: "jane@campus.test".to_string(),
        ..register_request("janet")
    };
    assert!(matches!(
        admins.register(root, same_email).await,
        Err(AuthError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;

    let incomplete = RegisterAdminRequest {
        password: " ".to_string(),
        phone_number: String::new(),
        ..register_request("jane")
    };
    match admins.register(root, incomplete).await {
        Err(AuthError::BadRequest(message)) => {
            assert!(message.contains("password"));
            assert!(message.contains("phoneNumber"));
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

// --- List ---

#[tokio::test]
async fn test_list_is_newest_first() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    admins.register(root, register_request("jane")).await.unwrap();

    let listed = admins.list().await.unwrap();
    let usernames: Vec<&str> = listed.iter().map(|a| a.username.as_str()).collect();
    assert_eq!(usernames, vec!["jane", "root"]);
}

// --- Own Details ---

#[tokio::test]
async fn test_update_details_checks_other_admins_only() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;
    let jane = admins.register(root, register_request("jane")).await.unwrap();

    // Re-submitting one's own username and email is not a conflict.
    let updated = admins
        .update_details(
            jane.id,
            UpdateAdminDetailsRequest {
                name: "Jane Updated".to_string(),
                username: "jane".to_string(),
                email: "jane@campus.test".to_string(),
                phone_number: "0722222222".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Jane Updated");
    assert_eq!(updated.updated_by, Some(jane.id));

    let taken = admins
        .update_details(
            jane.id,
            UpdateAdminDetailsRequest {
                name: "Jane".to_string(),
                username: "root".to_string(),
                email: "jane@campus.test".to_string(),
                phone_number: "0722222222".to_string(),
            },
        )
        .await;
    assert!(matches!(taken, Err(AuthError::Conflict(_))));
}

// --- Password ---

#[tokio::test]
async fn test_change_password_revokes_session() {
    let (repo, admins, session) = setup();
    let root = bootstrap_root(&admins).await;
    let (_, pair) = session.login("root", "root-password").await.unwrap();

    let wrong = admins
        .change_password(
            root,
            ChangePasswordRequest {
                current_password: "not-it".to_string(),
                new_password: "next-password".to_string(),
            },
        )
        .await;
    assert!(matches!(
        wrong,
        Err(AuthError::Unauthorized(UnauthorizedReason::InvalidCredentials))
    ));

    admins
        .change_password(
            root,
            ChangePasswordRequest {
                current_password: "root-password".to_string(),
                new_password: "next-password".to_string(),
            },
        )
        .await
        .unwrap();

    let stored = repo.find_by_id(root).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, None);
    assert!(session.refresh(Some(&pair.refresh_token)).await.is_err());
    assert!(session.login("root", "root-password").await.is_err());
    assert!(session.login("root", "next-password").await.is_ok());
}

// --- Status & Verification ---

#[tokio::test]
async fn test_deactivate_and_activate_audit_fields() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;
    let jane = admins.register(root, register_request("jane")).await.unwrap();

    let deactivated = admins.deactivate(root, jane.id).await.unwrap();
    assert_eq!(deactivated.status, AdminStatus::Inactive);
    assert_eq!(deactivated.deleted_by, Some(root));
    assert_eq!(deactivated.updated_by, Some(root));

    let activated = admins.activate(root, jane.id).await.unwrap();
    assert_eq!(activated.status, AdminStatus::Active);
    assert_eq!(activated.deleted_by, None);
}

#[tokio::test]
async fn test_deactivate_rejects_self_and_unknown() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;

    assert!(matches!(
        admins.deactivate(root, root).await,
        Err(AuthError::BadRequest(_))
    ));
    assert!(matches!(
        admins.deactivate(root, Uuid::new_v4()).await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        admins.activate(root, Uuid::new_v4()).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_set_verification() {
    let (_, admins, _) = setup();
    let root = bootstrap_root(&admins).await;
    let jane = admins.register(root, register_request("jane")).await.unwrap();

    assert!(matches!(
        admins.set_verification(root, jane.id, None).await,
        Err(AuthError::BadRequest(_))
    ));

    let verified = admins
        .set_verification(root, jane.id, Some(true))
        .await
        .unwrap();
    assert!(verified.verified);
    assert_eq!(verified.updated_by, Some(root));

    assert!(matches!(
        admins.set_verification(root, Uuid::new_v4(), Some(true)).await,
        Err(AuthError::NotFound(_))
    ));
}
