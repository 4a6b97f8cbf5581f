use actix_files as fs;
use actix_multipart::form::MultipartFormConfig;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthGate, SessionManager, TokenIssuer};
use crate::configuration::{JwtSettings, SessionSettings};
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::media_client::MediaUploader;
use crate::middleware::RequireAuth;
use crate::profile::ProfileService;
use crate::routes::{
    change_password, channel_profile, current_user, health_check, login, logout,
    refresh_access_token, register, update_account_details, update_avatar, update_cover_image,
    watch_history,
};
use crate::store::{ChannelStore, CredentialStore};

const JSON_BODY_LIMIT: usize = 16 * 1024;
const MULTIPART_TOTAL_LIMIT: usize = 25 * 1024 * 1024;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedRequest(err.to_string())).into()
        })
}

fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(MULTIPART_TOTAL_LIMIT)
        .error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedRequest(err.to_string())).into()
        })
}

/// Build the HTTP server over `store` (credentials and channel queries)
/// and `uploader` (media host).
pub fn run<S>(
    listener: TcpListener,
    store: Arc<S>,
    uploader: Arc<dyn MediaUploader>,
    jwt_config: JwtSettings,
    session_config: SessionSettings,
) -> Result<Server, std::io::Error>
where
    S: CredentialStore + ChannelStore + 'static,
{
    let credentials: Arc<dyn CredentialStore> = store.clone();
    let channels: Arc<dyn ChannelStore> = store;
    let tokens = TokenIssuer::new(jwt_config);

    let sessions = web::Data::new(SessionManager::new(
        credentials.clone(),
        tokens.clone(),
        session_config.revoke_on_password_change,
    ));
    let profiles = web::Data::new(ProfileService::new(credentials.clone()));
    let channels: web::Data<dyn ChannelStore> = web::Data::from(channels);
    let uploader: web::Data<dyn MediaUploader> = web::Data::from(uploader);
    let session_config = web::Data::new(session_config);
    let require_auth = RequireAuth::new(AuthGate::new(credentials, tokens));

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Extractor limits
            .app_data(json_config())
            .app_data(multipart_config())

            // Shared state
            .app_data(sessions.clone())
            .app_data(profiles.clone())
            .app_data(channels.clone())
            .app_data(uploader.clone())
            .app_data(session_config.clone())

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    // Public
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_access_token))

                    // Behind the auth gate
                    .service(
                        web::resource("/logout")
                            .wrap(require_auth.clone())
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(require_auth.clone())
                            .route(web::post().to(change_password)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(require_auth.clone())
                            .route(web::get().to(current_user)),
                    )
                    .service(
                        web::resource("/update-account")
                            .wrap(require_auth.clone())
                            .route(web::patch().to(update_account_details)),
                    )
                    .service(
                        web::resource("/avatar")
                            .wrap(require_auth.clone())
                            .route(web::patch().to(update_avatar)),
                    )
                    .service(
                        web::resource("/cover-image")
                            .wrap(require_auth.clone())
                            .route(web::patch().to(update_cover_image)),
                    )
                    .service(
                        web::resource("/c/{username}")
                            .wrap(require_auth.clone())
                            .route(web::get().to(channel_profile)),
                    )
                    .service(
                        web::resource("/history")
                            .wrap(require_auth.clone())
                            .route(web::get().to(watch_history)),
                    ),
            )

            // Static file serving (must be last to not override API routes)
            .service(fs::Files::new("/", "./public").index_file("index.html"))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
