/// Account Routes
///
/// Registration, login/logout, token refresh, password change and profile
/// updates under `/api/v1/users`.

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::account::AccountView;
use crate::api_response::{ApiResponse, Empty};
use crate::auth::{
    Credentials, Registration, RegistrationInput, SessionManager, TokenPair,
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::configuration::SessionSettings;
use crate::error::{AppError, UploadError, ValidationError};
use crate::media_client::MediaUploader;
use crate::profile::ProfileService;

/// Multipart registration form
#[derive(MultipartForm)]
pub struct RegisterForm {
    #[multipart(rename = "fullName")]
    pub full_name: Option<Text<String>>,
    pub username: Option<Text<String>>,
    pub email: Option<Text<String>>,
    pub password: Option<Text<String>>,
    #[multipart(limit = "10MB")]
    pub avatar: Option<TempFile>,
    #[multipart(rename = "coverImage", limit = "10MB")]
    pub cover_image: Option<TempFile>,
}

#[derive(MultipartForm)]
pub struct AvatarForm {
    #[multipart(limit = "10MB")]
    pub avatar: Option<TempFile>,
}

#[derive(MultipartForm)]
pub struct CoverImageForm {
    #[multipart(rename = "coverImage", limit = "10MB")]
    pub cover_image: Option<TempFile>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(|t| t.0)
}

/// Uploaded file with content, if any
fn present(file: Option<TempFile>) -> Option<TempFile> {
    file.filter(|f| f.size > 0)
}

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .secure(secure)
        .path("/")
        .finish()
}

fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = auth_cookie(name, String::new(), secure);
    cookie.make_removal();
    cookie
}

fn with_token_cookies(
    mut builder: actix_web::HttpResponseBuilder,
    tokens: &TokenPair,
    secure: bool,
) -> actix_web::HttpResponseBuilder {
    builder
        .cookie(auth_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone(), secure))
        .cookie(auth_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone(), secure));
    builder
}

/// POST /api/v1/users/register
///
/// Multipart: `fullName`, `username`, `email`, `password`, `avatar` (file,
/// required), `coverImage` (file, optional).
///
/// # Errors
/// - 400: missing/blank field or no avatar file
/// - 409: username or email already registered
/// - 500: media host returned no avatar url
pub async fn register(
    MultipartForm(form): MultipartForm<RegisterForm>,
    sessions: web::Data<SessionManager>,
    uploader: web::Data<dyn MediaUploader>,
) -> Result<HttpResponse, AppError> {
    let mut registration = Registration::parse(RegistrationInput {
        username: text(form.username),
        email: text(form.email),
        password: text(form.password),
        full_name: text(form.full_name),
    })?;

    // 업로드 전에 중복 계정 확인
    sessions
        .ensure_available(&registration.username, &registration.email)
        .await?;

    let avatar_file = present(form.avatar)
        .ok_or_else(|| ValidationError::EmptyField("avatar".to_string()))?;
    let avatar = uploader
        .upload(avatar_file.file.path())
        .await
        .ok_or_else(|| UploadError::NoResult("avatar".to_string()))?;

    let cover_image = match present(form.cover_image) {
        Some(cover_file) => uploader.upload(cover_file.file.path()).await,
        None => None,
    };

    registration.avatar = Some(avatar.url);
    registration.cover_image = cover_image.map(|media| media.url);

    let account = sessions.register(registration).await?;

    Ok(ApiResponse::new(StatusCode::CREATED, account, "User registered successfully")
        .respond(HttpResponse::Created()))
}

/// POST /api/v1/users/login
///
/// JSON `{username | email, password}`. Sets `accessToken` and
/// `refreshToken` cookies and returns both tokens in the body as well.
///
/// # Errors
/// - 400: no identity key or no password
/// - 404: no such account
/// - 401: wrong password
pub async fn login(
    body: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager>,
    session_config: web::Data<SessionSettings>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let outcome = sessions
        .login(Credentials {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    let builder = with_token_cookies(
        HttpResponse::Ok(),
        &outcome.tokens(),
        session_config.secure_cookies,
    );
    Ok(ApiResponse::new(StatusCode::OK, outcome, "User logged in successfully").respond(builder))
}

/// POST /api/v1/users/logout (authenticated)
pub async fn logout(
    account: web::ReqData<AccountView>,
    sessions: web::Data<SessionManager>,
    session_config: web::Data<SessionSettings>,
) -> Result<HttpResponse, AppError> {
    sessions.logout(account.id).await?;

    let secure = session_config.secure_cookies;
    let mut builder = HttpResponse::Ok();
    builder
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE, secure))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE, secure));

    Ok(ApiResponse::new(StatusCode::OK, Empty {}, "User logged out").respond(builder))
}

/// POST /api/v1/users/refresh-token
///
/// Refresh token from the `refreshToken` cookie, else from the JSON body.
/// Implements rotation: the presented token stops working once this returns.
///
/// # Errors
/// - 401: missing, invalid, expired, or already-rotated refresh token
pub async fn refresh_access_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    sessions: web::Data<SessionManager>,
    session_config: web::Data<SessionSettings>,
) -> Result<HttpResponse, AppError> {
    let incoming = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let tokens = sessions.refresh(incoming.as_deref()).await?;

    let builder = with_token_cookies(HttpResponse::Ok(), &tokens, session_config.secure_cookies);
    Ok(ApiResponse::new(StatusCode::OK, tokens, "Access token refreshed").respond(builder))
}

/// POST /api/v1/users/change-password (authenticated)
///
/// # Errors
/// - 400: missing old or new password
/// - 401: old password does not match
pub async fn change_password(
    account: web::ReqData<AccountView>,
    body: web::Json<ChangePasswordRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    sessions
        .change_password(
            account.id,
            body.old_password.as_deref(),
            body.new_password.as_deref(),
        )
        .await?;

    Ok(ApiResponse::new(StatusCode::OK, Empty {}, "Password changed successfully")
        .respond(HttpResponse::Ok()))
}

/// GET /api/v1/users/current-user (authenticated)
pub async fn current_user(account: web::ReqData<AccountView>) -> HttpResponse {
    ApiResponse::new(StatusCode::OK, account.into_inner(), "User fetched successfully")
        .respond(HttpResponse::Ok())
}

/// PATCH /api/v1/users/update-account (authenticated)
///
/// # Errors
/// - 400: fullName or email missing/invalid
/// - 409: email belongs to another account
pub async fn update_account_details(
    account: web::ReqData<AccountView>,
    body: web::Json<UpdateAccountRequest>,
    profiles: web::Data<ProfileService>,
) -> Result<HttpResponse, AppError> {
    let updated = profiles
        .update_details(account.id, body.full_name.as_deref(), body.email.as_deref())
        .await?;

    Ok(ApiResponse::new(StatusCode::OK, updated, "Account details updated successfully")
        .respond(HttpResponse::Ok()))
}

/// PATCH /api/v1/users/avatar (authenticated, multipart `avatar`)
pub async fn update_avatar(
    account: web::ReqData<AccountView>,
    MultipartForm(form): MultipartForm<AvatarForm>,
    uploader: web::Data<dyn MediaUploader>,
    profiles: web::Data<ProfileService>,
) -> Result<HttpResponse, AppError> {
    let file = present(form.avatar)
        .ok_or_else(|| ValidationError::EmptyField("avatar".to_string()))?;
    let media = uploader
        .upload(file.file.path())
        .await
        .ok_or_else(|| UploadError::NoResult("avatar".to_string()))?;

    let updated = profiles.update_avatar(account.id, &media.url).await?;

    Ok(ApiResponse::new(StatusCode::OK, updated, "Avatar image updated successfully")
        .respond(HttpResponse::Ok()))
}

/// PATCH /api/v1/users/cover-image (authenticated, multipart `coverImage`)
pub async fn update_cover_image(
    account: web::ReqData<AccountView>,
    MultipartForm(form): MultipartForm<CoverImageForm>,
    uploader: web::Data<dyn MediaUploader>,
    profiles: web::Data<ProfileService>,
) -> Result<HttpResponse, AppError> {
    let file = present(form.cover_image)
        .ok_or_else(|| ValidationError::EmptyField("coverImage".to_string()))?;
    let media = uploader
        .upload(file.file.path())
        .await
        .ok_or_else(|| UploadError::NoResult("cover image".to_string()))?;

    let updated = profiles.update_cover_image(account.id, &media.url).await?;

    Ok(ApiResponse::new(StatusCode::OK, updated, "Cover image updated successfully")
        .respond(HttpResponse::Ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie_flags() {
        let cookie = auth_cookie(ACCESS_TOKEN_COOKIE, "token".to_string(), true);

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = removal_cookie(REFRESH_TOKEN_COOKIE, true);

        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().is_some());
    }
}
