use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::account::AccountView;
use crate::api_response::ApiResponse;
use crate::error::{AppError, ValidationError};
use crate::store::ChannelStore;

/// GET /api/v1/users/c/{username} (authenticated)
///
/// Public channel view with subscriber counts and whether the caller is
/// subscribed to it.
///
/// # Errors
/// - 400: blank username
/// - 404: no channel with that username
pub async fn channel_profile(
    path: web::Path<String>,
    viewer: web::ReqData<AccountView>,
    channels: web::Data<dyn ChannelStore>,
) -> Result<HttpResponse, AppError> {
    let username = path.trim().to_lowercase();
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()).into());
    }

    let profile = channels
        .channel_profile(&username, viewer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

    Ok(ApiResponse::new(StatusCode::OK, profile, "User channel fetched successfully")
        .respond(HttpResponse::Ok()))
}

/// GET /api/v1/users/history (authenticated)
pub async fn watch_history(
    viewer: web::ReqData<AccountView>,
    channels: web::Data<dyn ChannelStore>,
) -> Result<HttpResponse, AppError> {
    let history = channels.watch_history(viewer.id).await?;

    tracing::debug!(account_id = %viewer.id, entries = history.len(), "Watch history loaded");

    Ok(ApiResponse::new(StatusCode::OK, history, "Watch history fetched successfully")
        .respond(HttpResponse::Ok()))
}
