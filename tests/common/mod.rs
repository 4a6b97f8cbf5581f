#![allow(dead_code)]

use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use vidtube_accounts::configuration::{JwtSettings, SessionSettings};
use vidtube_accounts::media_client::{MediaUploader, UploadedMedia};
use vidtube_accounts::startup::run;
use vidtube_accounts::store::InMemoryStore;

/// Uploader that hands back a fresh fake url per call, or nothing once
/// switched off.
#[derive(Default)]
pub struct StubUploader {
    offline: AtomicBool,
    uploads: AtomicUsize,
}

impl StubUploader {
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaUploader for StubUploader {
    async fn upload(&self, _local_path: &Path) -> Option<UploadedMedia> {
        if self.offline.load(Ordering::SeqCst) {
            return None;
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Some(UploadedMedia {
            url: format!("https://media.test/upload/{}.png", n),
        })
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub uploader: Arc<StubUploader>,
    pub client: reqwest::Client,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        access_token_secret: "integration-access-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_secret: "integration-refresh-secret".to_string(),
        refresh_token_expiry: 864000,
        issuer: "vidtube".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(SessionSettings {
        revoke_on_password_change: false,
        secure_cookies: false,
    })
    .await
}

pub async fn spawn_app_with(session: SessionSettings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryStore::new());
    let uploader = Arc::new(StubUploader::default());

    let server = run(
        listener,
        store.clone(),
        uploader.clone(),
        jwt_settings(),
        session,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        uploader,
        client: reqwest::Client::new(),
    }
}

pub fn image_part(name: &str) -> Part {
    Part::bytes(vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a])
        .file_name(format!("{}.png", name))
        .mime_str("image/png")
        .unwrap()
}

pub fn registration_form(username: &str, email: &str, password: &str) -> Form {
    Form::new()
        .text("fullName", format!("{} Example", username))
        .text("username", username.to_string())
        .text("email", email.to_string())
        .text("password", password.to_string())
        .part("avatar", image_part("avatar"))
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub async fn post_register(&self, form: Form) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register `username` with a default email and return the account json
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let email = format!("{}@example.com", username);
        let response = self
            .post_register(registration_form(username, &email, password))
            .await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"].clone()
    }

    pub async fn post_login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Log in and return `(accessToken, refreshToken)`
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let response = self
            .post_login(json!({ "username": username, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        (
            body["data"]["accessToken"].as_str().unwrap().to_string(),
            body["data"]["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    pub async fn post_refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/refresh-token"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_authed(&self, path: &str, access_token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
