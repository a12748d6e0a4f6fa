use heritage_portal::{
    AppState, create_router,
    config::AppConfig,
    identity::{IdentityState, MemoryIdentity},
    models::{Profile, Role, USERS_COLLECTION},
    prefs::{MemoryPreferences, PrefState},
    resolver::SessionResolver,
    store::{DocumentStore, MemoryStore, StoreState},
};
use reqwest::{StatusCode, redirect::Policy};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
}

async fn spawn_app() -> TestApp {
    let config = AppConfig::default();
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(MemoryIdentity::new(config.jwt_secret.clone()));
    let resolver = Arc::new(SessionResolver::new(store.clone() as StoreState));

    let state = AppState {
        store: store.clone() as StoreState,
        identity: identity.clone() as IdentityState,
        resolver,
        prefs: Arc::new(MemoryPreferences::new()) as PrefState,
        config,
    };
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
        store,
        identity,
    }
}

// Redirects are assertions here, so the client must not follow them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn seed_admin(app: &TestApp) -> (Uuid, String) {
    let uid = app.identity.register_account("boss@example.com", "secret123");
    let profile = Profile {
        name: Some("Boss".to_owned()),
        email: "boss@example.com".to_owned(),
        role: Some(Role::Admin),
    };
    app.store
        .set_document(USERS_COLLECTION, &uid.to_string(), profile.to_fields())
        .await
        .unwrap();

    let response = client()
        .post(format!("{}/login", app.address))
        .json(&json!({"email": "boss@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap().to_owned();
    (uid, token)
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn anonymous_entry_renders_the_login_surface() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["page"], "login");
}

#[tokio::test]
async fn entry_redirects_an_established_admin_session_to_the_console() {
    let app = spawn_app().await;
    let (_uid, token) = seed_admin(&app).await;

    let response = client()
        .get(format!("{}/", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin");
}

#[tokio::test]
async fn anonymous_requests_to_guarded_pages_bounce_to_login() {
    let app = spawn_app().await;

    for path in ["/admin", "/admin/stats", "/admin/users", "/user", "/me"] {
        let response = client()
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "path {path}");
        assert_eq!(response.headers()["location"], "/", "path {path}");
    }
}

#[tokio::test]
async fn a_signed_in_user_cannot_reach_the_admin_console() {
    let app = spawn_app().await;
    let response = client()
        .post(format!("{}/register", app.address))
        .json(&json!({
            "email": "member@example.com",
            "password": "secret123",
            "name": "Member"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["redirect_to"], "/user");
    let token = body["access_token"].as_str().unwrap();

    // The member's own dashboard renders.
    let response = client()
        .get(format!("{}/user", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The admin console redirects them home instead of rendering.
    let response = client()
        .get(format!("{}/admin/stats", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/user");
}

#[tokio::test]
async fn an_admin_is_pushed_off_the_user_dashboard_to_the_console() {
    let app = spawn_app().await;
    let (_uid, token) = seed_admin(&app).await;

    let response = client()
        .get(format!("{}/user", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/admin");

    let response = client()
        .get(format!("{}/admin/stats", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn the_local_dev_header_bypasses_token_verification_only() {
    let app = spawn_app().await;
    let uid = Uuid::new_v4();
    app.store
        .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "admin"}))
        .await
        .unwrap();

    // The role lookup still runs: this uid's profile says admin.
    let response = client()
        .get(format!("{}/admin/users", app.address))
        .header("x-user-id", uid.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // An unknown uid resolves no role and is bounced to login.
    let response = client()
        .get(format!("{}/admin/users", app.address))
        .header("x-user-id", Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
}

#[tokio::test]
async fn logout_lands_back_on_the_login_route() {
    let app = spawn_app().await;
    let (_uid, token) = seed_admin(&app).await;

    let response = client()
        .post(format!("{}/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["redirect_to"], "/");
}

#[tokio::test]
async fn unknown_paths_fall_back_to_the_entry_route() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/no-such-page", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert!(body["paths"]["/login"].is_object());
}
