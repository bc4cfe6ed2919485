use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use evoting_service::api;
use evoting_service::config::Config;
use evoting_service::database::{MongoDB, MongoUserStore};
use evoting_service::middleware::SecurityHeaders;
use evoting_service::state::AppState;

const CONNECT_RETRIES: u32 = 3;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting E-Voting Auth Service...");
    log::info!(
        "🔧 MONGODB_URI: {}",
        if config.mongodb_uri_set { "set" } else { "not set, using default" }
    );
    log::info!("🔧 JWT_SECRET: set");

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    log::info!("📁 Uploads served from {}", config.upload_dir.display());

    let db = MongoDB::connect_with_retry(
        &config.mongodb_uri,
        &config.mongodb_database,
        CONNECT_RETRIES,
        CONNECT_RETRY_DELAY,
    )
    .await
    .map_err(|e| {
        log::error!("❌ Unusable MONGODB_URI: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let state = AppState::new(Arc::new(MongoUserStore::new(db)), config.clone());
    let state_data = web::Data::new(state);

    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = if config.cors_origins.is_empty() {
            Cors::default().allow_any_origin()
        } else {
            config
                .cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        }
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .supports_credentials()
        .max_age(3600);

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::swagger::ApiDoc::openapi()),
            )
            .configure(|cfg| api::configure(cfg, &config))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
