use axum::{body::Body, http::Request};
use campus_admin::{
    AppState, create_router,
    config::AppConfig,
    hasher::{BcryptHasher, CredentialHasher, HasherState},
    models::NewAdmin,
    repository::{AdminRepository, InMemoryRepository, RepositoryState},
};
use reqwest::{StatusCode, header::SET_COOKIE};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
    pub admin_id: Uuid,
}

/// Serves the full router over an in-memory store seeded with one admin (`root`).
async fn spawn_app() -> TestApp {
    let (state, repo, admin_id) = test_state().await;
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        admin_id,
    }
}

async fn test_state() -> (AppState, Arc<InMemoryRepository>, Uuid) {
    let repo = Arc::new(InMemoryRepository::new());
    let hasher = Arc::new(BcryptHasher::new(4)) as HasherState;
    let admin = repo
        .create_admin(NewAdmin {
            name: "Root Admin".to_string(),
            username: "root".to_string(),
            email: "root@campus.test".to_string(),
            phone_number: "0700000000".to_string(),
            profile: None,
            password_hash: hasher.hash("root-password").await.unwrap(),
            created_by: None,
        })
        .await
        .unwrap();

    let state = AppState::new(AppConfig::default(), repo.clone() as RepositoryState, hasher);
    (state, repo, admin.id)
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn login(&self, client: &reqwest::Client) -> (String, String) {
        let body: Value = client
            .post(self.url("/api/admin/login"))
            .json(&json!({ "username": "root", "password": "root-password" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }
}

fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = reqwest::get(app.url("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_login_sets_cookies_and_returns_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "username": "root", "password": "root-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
    }

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["admin"]["username"], "root");
    assert!(body["data"]["admin"].get("passwordHash").is_none());
    assert!(body["data"]["admin"].get("refreshToken").is_none());

    let access = body["data"]["accessToken"].as_str().unwrap();
    let refresh = body["data"]["refreshToken"].as_str().unwrap();
    assert!(cookies.iter().any(|c| c.starts_with(&format!("accessToken={access};"))));
    assert!(cookies.iter().any(|c| c.starts_with(&format!("refreshToken={refresh};"))));

    let stored = app.repo.find_by_id(app.admin_id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some(refresh));
}

#[tokio::test]
async fn test_login_failures_use_error_envelope() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let wrong = client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "username": "root", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["errorType"], "unauthorized");
    assert_eq!(body["reason"], "invalid_credentials");

    let unknown = client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "username": "ghost", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let blank = client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "username": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gate_reports_missing_and_expired_tokens() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client.get(app.url("/api/admin/me")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["reason"], "missing_token");

    let (access, _) = app.login(&client).await;
    let me = client
        .get(app.url("/api/admin/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body: Value = me.json().await.unwrap();
    assert_eq!(body["data"]["id"], app.admin_id.to_string());

    let via_cookie = client
        .get(app.url("/api/admin/me"))
        .header("cookie", format!("accessToken={access}"))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(via_cookie.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_via_body_cookie_and_replay() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, r1) = app.login(&client).await;

    let rotated = client
        .post(app.url("/api/admin/refresh-token"))
        .json(&json!({ "refreshToken": r1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(rotated.status(), StatusCode::OK);
    assert_eq!(set_cookies(&rotated).len(), 2);
    let body: Value = rotated.json().await.unwrap();
    let r2 = body["data"]["refreshToken"].as_str().unwrap().to_string();

    let replay = client
        .post(app.url("/api/admin/refresh-token"))
        .json(&json!({ "refreshToken": r1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let body: Value = replay.json().await.unwrap();
    assert_eq!(body["reason"], "refresh_token_reused");
    assert_eq!(body["message"], "refresh token is expired or used");

    // Cookie only, no body at all.
    let via_cookie = client
        .post(app.url("/api/admin/refresh-token"))
        .header("cookie", format!("refreshToken={r2}"))
        .send()
        .await
        .unwrap();
    assert_eq!(via_cookie.status(), StatusCode::OK);

    let none = client
        .post(app.url("/api/admin/refresh-token"))
        .send()
        .await
        .unwrap();
    assert_eq!(none.status(), StatusCode::UNAUTHORIZED);
    let body: Value = none.json().await.unwrap();
    assert_eq!(body["reason"], "missing_token");
}

#[tokio::test]
async fn test_logout_clears_cookies_and_session() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (access, refresh) = app.login(&client).await;

    let response = client
        .post(app.url("/api/admin/logout"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let stored = app.repo.find_by_id(app.admin_id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, None);

    let refresh_after = client
        .post(app.url("/api/admin/refresh-token"))
        .bearer_auth(&refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(refresh_after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_and_manage_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (access, _) = app.login(&client).await;

    let payload = json!({
        "name": "Jane Registrar",
        "username": "jane",
        "email": "jane@campus.test",
        "password": "jane-password",
        "phoneNumber": "0711111111"
    });

    let created = client
        .post(app.url("/api/admin/register"))
        .bearer_auth(&access)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["createdBy"], app.admin_id.to_string());
    let jane_id = body["data"]["id"].as_str().unwrap().to_string();

    let duplicate = client
        .post(app.url("/api/admin/register"))
        .bearer_auth(&access)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let verified = client
        .put(app.url(&format!("/api/admin/admins/{jane_id}/verification")))
        .bearer_auth(&access)
        .json(&json!({ "verified": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(verified.status(), StatusCode::OK);

    let deactivated = client
        .put(app.url(&format!("/api/admin/admins/{jane_id}/deactivate")))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(deactivated.status(), StatusCode::OK);
    let body: Value = deactivated.json().await.unwrap();
    assert_eq!(body["data"]["status"], "inactive");

    let inactive_login = client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "username": "jane", "password": "jane-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(inactive_login.status(), StatusCode::UNAUTHORIZED);
    let body: Value = inactive_login.json().await.unwrap();
    assert_eq!(body["reason"], "account_inactive");

    let listed: Value = client
        .get(app.url("/api/admin/admins"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_password_change_ends_session() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (access, refresh) = app.login(&client).await;

    let response = client
        .put(app.url("/api/admin/password"))
        .bearer_auth(&access)
        .json(&json!({ "currentPassword": "root-password", "newPassword": "fresh-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).iter().all(|c| c.contains("Max-Age=0")));

    let refresh_after = client
        .post(app.url("/api/admin/refresh-token"))
        .json(&json!({ "refreshToken": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(refresh_after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_lists_session_routes() {
    let (state, _, _) = test_state().await;
    let router = create_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"].get("/api/admin/login").is_some());
    assert!(doc["paths"].get("/api/admin/refresh-token").is_some());
}
