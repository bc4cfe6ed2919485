pub mod auth;
pub mod health;
pub mod swagger;

use actix_files::Files;
use actix_web::web;

use crate::config::Config;
use crate::middleware::AuthMiddleware;
use crate::services::upload_service;
use crate::utils::AppError;

/// Registers every route. Shared by the binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .route("/", web::get().to(health::root))
    .route("/health", web::get().to(health::health_check))
    .route("/api/ping", web::get().to(health::ping))
    .service(
        web::scope("/api/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            // Protected endpoints requiring a bearer token
            .service(
                web::resource("/profile")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::get_profile)),
            )
            .service(
                web::resource("/upload-profile")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(auth::upload_profile)),
            )
            .service(
                web::resource("/delete-profile-picture")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(auth::delete_profile_picture)),
            )
            .service(
                web::resource("/delete-profile")
                    .wrap(AuthMiddleware)
                    .route(web::delete().to(auth::delete_profile)),
            ),
    )
    .service(Files::new(upload_service::PUBLIC_PREFIX, &config.upload_dir));
}
