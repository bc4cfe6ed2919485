use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;

use crate::middleware::AuthenticatedUser;
use crate::models::UserInfo;
use crate::services::auth_service::{self, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::upload_service;
use crate::state::AppState;
use crate::utils::{AppError, AppResult, PayloadError};

/// Multipart field carrying the picture.
pub const PICTURE_FIELD: &str = "profilePicture";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Malformed username, email or password"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /api/auth/register - email: {}", request.email);

    match auth_service::register(state.users.as_ref(), &state.config, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", response.user.email);
            Ok(HttpResponse::Created().json(response))
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /api/auth/login - email: {}", request.email);

    match auth_service::login(state.users.as_ref(), &state.config, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "User information retrieved", body = UserInfo),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /api/auth/profile - user: {}", user.user_id);

    match auth_service::get_current_user(state.users.as_ref(), &user.user_id).await {
        Ok(profile) => {
            log::info!("✅ Profile retrieved: {}", profile.email);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "user": profile
            })))
        }
        Err(e) => {
            log::warn!("❌ Profile lookup failed: {} - {}", user.user_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/upload-profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Picture stored; body carries its public path"),
        (status = 400, description = "No file in the request"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not an accepted image type")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    log::info!("📤 POST /api/auth/upload-profile - user: {}", user.user_id);

    let result = match read_picture(&mut payload, state.config.max_upload_bytes).await {
        Ok(upload) => {
            upload_service::save_profile_picture(
                state.users.as_ref(),
                &state.config,
                &user.user_id,
                &upload.content_type,
                &upload.bytes,
            )
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(path) => {
            log::info!("✅ Profile picture uploaded: {} -> {}", user.user_id, path);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Profile picture uploaded",
                "profilePicture": path
            })))
        }
        Err(e) => {
            log::warn!("❌ Profile picture upload failed: {} - {}", user.user_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/delete-profile-picture",
    tag = "Auth",
    responses(
        (status = 200, description = "Picture reference cleared (idempotent)"),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_profile_picture(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ POST /api/auth/delete-profile-picture - user: {}", user.user_id);

    match upload_service::delete_profile_picture(state.users.as_ref(), &state.config, &user.user_id)
        .await
    {
        Ok(()) => {
            log::info!("✅ Profile picture deleted: {}", user.user_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Profile picture deleted"
            })))
        }
        Err(e) => {
            log::warn!("❌ Profile picture delete failed: {} - {}", user.user_id, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/auth/delete-profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ DELETE /api/auth/delete-profile - user: {}", user.user_id);

    match auth_service::delete_user_account(state.users.as_ref(), &state.config, &user.user_id)
        .await
    {
        Ok(()) => {
            log::info!("✅ Account deleted: {}", user.user_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Account deleted"
            })))
        }
        Err(e) => {
            log::warn!("❌ Account deletion failed: {} - {}", user.user_id, e);
            Err(e)
        }
    }
}

struct UploadedFile {
    content_type: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {}", e))
}

/// Reads the picture field (or the first file field), aborting once `limit` is exceeded.
async fn read_picture(payload: &mut Multipart, limit: usize) -> AppResult<UploadedFile> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let is_picture = field.name() == Some(PICTURE_FIELD);
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();

        if !is_picture && !is_file {
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }

        let content_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        upload_service::extension_for(&content_type)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > limit {
                return Err(PayloadError::TooLarge { limit }.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(UploadedFile {
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation("No file uploaded".to_string()))
}
