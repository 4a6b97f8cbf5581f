mod common;

use common::{image_part, registration_form, spawn_app, spawn_app_with};
use reqwest::multipart::Form;
use serde_json::{json, Value};
use vidtube_accounts::configuration::SessionSettings;

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_without_secrets() {
    let app = spawn_app().await;

    let response = app
        .post_register(registration_form("Alice", "Alice@Example.com", "p1"))
        .await;

    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"]["avatar"].as_str().unwrap().starts_with("https://media.test/"));
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("refreshToken").is_none());
    assert!(body["data"].get("refreshTokenHash").is_none());
}

#[tokio::test]
async fn register_uploads_optional_cover_image() {
    let app = spawn_app().await;

    let form = registration_form("carol", "carol@example.com", "p1")
        .part("coverImage", image_part("cover"));
    let response = app.post_register(form).await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["coverImage"].is_string());
    assert_eq!(2, app.uploader.upload_count());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username_or_email() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;

    let same_username = app
        .post_register(registration_form("alice", "other@example.com", "p1"))
        .await;
    let same_email = app
        .post_register(registration_form("other", "ALICE@example.com", "p1"))
        .await;

    assert_eq!(409, same_username.status().as_u16());
    assert_eq!(409, same_email.status().as_u16());
    // duplicates are rejected before anything is uploaded
    assert_eq!(1, app.uploader.upload_count());
}

#[tokio::test]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app().await;

    let test_cases = vec![
        (
            Form::new()
                .text("fullName", "No Email")
                .text("username", "noemail")
                .text("password", "p1")
                .part("avatar", image_part("avatar")),
            "missing email",
        ),
        (
            Form::new()
                .text("fullName", "Blank User")
                .text("username", "   ")
                .text("email", "blank@example.com")
                .text("password", "p1")
                .part("avatar", image_part("avatar")),
            "blank username",
        ),
        (
            Form::new()
                .text("username", "nofullname")
                .text("email", "nofullname@example.com")
                .text("password", "p1")
                .part("avatar", image_part("avatar")),
            "missing fullName",
        ),
    ];

    for (form, description) in test_cases {
        let response = app.post_register(form).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn register_returns_400_without_avatar() {
    let app = spawn_app().await;

    let form = Form::new()
        .text("fullName", "No Avatar")
        .text("username", "noavatar")
        .text("email", "noavatar@example.com")
        .text("password", "p1");
    let response = app.post_register(form).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn register_returns_500_when_avatar_upload_fails() {
    let app = spawn_app().await;
    app.uploader.go_offline();

    let response = app
        .post_register(registration_form("alice", "alice@example.com", "p1"))
        .await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UPLOAD_FAILURE");

    // nothing was persisted, so the name is still free
    let login = app.post_login(json!({ "username": "alice", "password": "p1" })).await;
    assert_eq!(404, login.status().as_u16());
}

// --- Login Tests ---

#[tokio::test]
async fn login_sets_http_only_cookies() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;

    let response = app
        .post_login(json!({ "email": "alice@example.com", "password": "p1" }))
        .await;

    assert_eq!(200, response.status().as_u16());

    let cookies: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("HttpOnly")));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert!(body["data"]["user"].get("refreshTokenHash").is_none());
}

#[tokio::test]
async fn login_error_statuses() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;

    let test_cases = vec![
        (json!({ "username": "alice", "password": "wrong" }), 401, "wrong password"),
        (json!({ "username": "nobody", "password": "p1" }), 404, "unknown user"),
        (json!({ "password": "p1" }), 400, "no identity key"),
        (json!({ "username": "alice" }), 400, "no password"),
    ];

    for (body, expected, description) in test_cases {
        let response = app.post_login(body).await;
        assert_eq!(
            expected,
            response.status().as_u16(),
            "Unexpected status for {}",
            description
        );
    }
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
}

// --- Refresh Tests ---

#[tokio::test]
async fn refresh_rotates_and_rejects_replayed_token() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (_, first_refresh) = app.login("alice", "p1").await;

    let response = app.post_refresh(&first_refresh).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let second_refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert!(body["data"]["accessToken"].is_string());
    assert_ne!(first_refresh, second_refresh);

    let replay = app.post_refresh(&first_refresh).await;
    assert_eq!(401, replay.status().as_u16());

    let next = app.post_refresh(&second_refresh).await;
    assert_eq!(200, next.status().as_u16());
}

#[tokio::test]
async fn refresh_reads_cookie_before_body() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (_, refresh) = app.login("alice", "p1").await;

    let response = app
        .client
        .post(app.url("/refresh-token"))
        .header("cookie", format!("refreshToken={}", refresh))
        .json(&json!({ "refreshToken": "garbage" }))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_returns_401_without_token() {
    let app = spawn_app().await;

    let response = app.client.post(app.url("/refresh-token")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());

    let garbage = app.post_refresh("not-a-jwt").await;
    assert_eq!(401, garbage.status().as_u16());
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (access, _) = app.login("alice", "p1").await;

    let response = app.post_refresh(&access).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn second_login_invalidates_first_refresh_token() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (_, first) = app.login("alice", "p1").await;
    let (_, second) = app.login("alice", "p1").await;

    assert_eq!(401, app.post_refresh(&first).await.status().as_u16());
    assert_eq!(200, app.post_refresh(&second).await.status().as_u16());
}

// --- Logout Tests ---

#[tokio::test]
async fn logout_clears_cookies_and_revokes_refresh() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (access, refresh) = app.login("alice", "p1").await;

    let response = app
        .client
        .post(app.url("/logout"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let cleared = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter(|v| v.to_str().unwrap().contains("Max-Age=0"))
        .count();
    assert_eq!(2, cleared);

    assert_eq!(401, app.post_refresh(&refresh).await.status().as_u16());
}

// --- Auth Gate Tests ---

#[tokio::test]
async fn protected_routes_return_401_without_valid_token() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (_, refresh) = app.login("alice", "p1").await;

    let no_token = app.client.get(app.url("/current-user")).send().await.unwrap();
    assert_eq!(401, no_token.status().as_u16());

    let garbage = app.get_authed("/current-user", "garbage").await;
    assert_eq!(401, garbage.status().as_u16());

    let wrong_kind = app.get_authed("/current-user", &refresh).await;
    assert_eq!(401, wrong_kind.status().as_u16());

    let not_bearer = app
        .client
        .get(app.url("/current-user"))
        .header("authorization", format!("Token {}", refresh))
        .send()
        .await
        .unwrap();
    assert_eq!(401, not_bearer.status().as_u16());

    let body: Value = no_token.json().await.unwrap();
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn current_user_accepts_cookie_or_bearer() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (access, _) = app.login("alice", "p1").await;

    let via_bearer = app.get_authed("/current-user", &access).await;
    assert_eq!(200, via_bearer.status().as_u16());
    let body: Value = via_bearer.json().await.unwrap();
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("passwordHash").is_none());

    let via_cookie = app
        .client
        .get(app.url("/current-user"))
        .header("cookie", format!("accessToken={}", access))
        .send()
        .await
        .unwrap();
    assert_eq!(200, via_cookie.status().as_u16());
}

// --- Password Change Tests ---

#[tokio::test]
async fn change_password_switches_credentials() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (access, refresh) = app.login("alice", "p1").await;

    let wrong_old = app
        .client
        .post(app.url("/change-password"))
        .bearer_auth(&access)
        .json(&json!({ "oldPassword": "nope", "newPassword": "p2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, wrong_old.status().as_u16());

    let response = app
        .client
        .post(app.url("/change-password"))
        .bearer_auth(&access)
        .json(&json!({ "oldPassword": "p1", "newPassword": "p2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let old = app.post_login(json!({ "username": "alice", "password": "p1" })).await;
    assert_eq!(401, old.status().as_u16());
    app.login("alice", "p2").await;

    // the session from before the change was replaced by the new login
    assert_eq!(401, app.post_refresh(&refresh).await.status().as_u16());
}

#[tokio::test]
async fn change_password_can_revoke_session() {
    let app = spawn_app_with(SessionSettings {
        revoke_on_password_change: true,
        secure_cookies: false,
    })
    .await;
    app.register("alice", "p1").await;
    let (access, refresh) = app.login("alice", "p1").await;

    let response = app
        .client
        .post(app.url("/change-password"))
        .bearer_auth(&access)
        .json(&json!({ "oldPassword": "p1", "newPassword": "p2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    assert_eq!(401, app.post_refresh(&refresh).await.status().as_u16());
}

#[tokio::test]
async fn change_password_keeps_session_by_default() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    let (access, refresh) = app.login("alice", "p1").await;

    app.client
        .post(app.url("/change-password"))
        .bearer_auth(&access)
        .json(&json!({ "oldPassword": "p1", "newPassword": "p2" }))
        .send()
        .await
        .unwrap();

    assert_eq!(200, app.post_refresh(&refresh).await.status().as_u16());
}

// --- Profile Tests ---

#[tokio::test]
async fn update_account_changes_details() {
    let app = spawn_app().await;
    app.register("alice", "p1").await;
    app.register("bob", "p1").await;
    let (access, _) = app.login("alice", "p1").await;

    let response = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&access)
        .json(&json!({ "fullName": "Alice Liddell", "email": "Liddell@Example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["fullName"], "Alice Liddell");
    assert_eq!(body["data"]["email"], "liddell@example.com");

    let taken = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&access)
        .json(&json!({ "fullName": "Alice", "email": "bob@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(409, taken.status().as_u16());

    let missing = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&access)
        .json(&json!({ "fullName": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing.status().as_u16());
}

#[tokio::test]
async fn update_avatar_and_cover_image() {
    let app = spawn_app().await;
    let registered = app.register("alice", "p1").await;
    let (access, _) = app.login("alice", "p1").await;

    let response = app
        .client
        .patch(app.url("/avatar"))
        .bearer_auth(&access)
        .multipart(Form::new().part("avatar", image_part("new-avatar")))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_ne!(registered["avatar"], body["data"]["avatar"]);

    let response = app
        .client
        .patch(app.url("/cover-image"))
        .bearer_auth(&access)
        .multipart(Form::new().part("coverImage", image_part("cover")))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["coverImage"].is_string());

    let no_file = app
        .client
        .patch(app.url("/avatar"))
        .bearer_auth(&access)
        .multipart(Form::new().text("note", "nothing attached"))
        .send()
        .await
        .unwrap();
    assert_eq!(400, no_file.status().as_u16());
}
