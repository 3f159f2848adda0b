#![allow(dead_code)]

pub mod pg;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use rolegate::accounts::create_account;
use rolegate::config::Config;
use rolegate::db::{MemoryUserStore, UserStore};
use rolegate::models::Role;

pub const TEST_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// A running test server backed by an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryUserStore>,
    pub config: Config,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login and return the token, panicking on failure.
    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let (body, status) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token missing").to_string()
    }

    /// Create an admin directly in the store and return its token.
    pub async fn seed_admin(&self, email: &str, password: &str) -> String {
        create_account(self.store.as_ref(), email, password, Role::Admin)
            .await
            .expect("seed admin failed");
        self.token_for(email, password).await
    }

    /// Register a regular user through the API and return its id.
    pub async fn seed_user(&self, email: &str, password: &str) -> String {
        let (_, status) = self.register(email, password).await;
        assert_eq!(status, StatusCode::CREATED);
        self.user_id(email).await
    }

    pub async fn user_id(&self, email: &str) -> String {
        self.store
            .find_by_email(email)
            .await
            .expect("store lookup failed")
            .expect("user missing")
            .id
            .to_string()
    }

    pub async fn role_of(&self, email: &str) -> Option<Role> {
        self.store
            .find_by_email(email)
            .await
            .expect("store lookup failed")
            .map(|u| u.role)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 65_536,
        log_level: "warn".to_string(),
        bootstrap_admin: None,
    }
}

/// Spawn a test app on a random port with an empty store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let config = test_config();

    let app = rolegate::build_app(store.clone(), config.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        store,
        config,
    }
}
