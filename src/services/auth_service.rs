use bcrypt::{hash, verify};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::database::UserStore;
use crate::models::{User, UserInfo};
use crate::services::upload_service;
use crate::utils::{AppError, AppResult};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 30;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

/// Normalized registration input.
#[derive(Debug, PartialEq)]
struct NewAccount {
    username: String,
    email: String,
}

fn validate_registration(request: &RegisterRequest) -> AppResult<NewAccount> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    let username_len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username_len) {
        return Err(AppError::Validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }

    let email = request.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation("Email format is invalid".to_string()));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(NewAccount {
        username: username.to_string(),
        email,
    })
}

// Generate JWT token
pub fn generate_jwt(user: &User, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = TimeDelta::try_hours(config.jwt_expiry_hours)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Token lifetime out of range: {} hours",
                config.jwt_expiry_hours
            ))
        })?;

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp().max(0) as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str, config: &Config) -> AppResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Token rejected: {}", e);
        AppError::Auth("Invalid or expired token".to_string())
    })
}

// User registration
pub async fn register(
    users: &dyn UserStore,
    config: &Config,
    request: &RegisterRequest,
) -> AppResult<AuthResponse> {
    let account = validate_registration(request)?;

    if users.find_by_email(&account.email).await?.is_some()
        || users.find_by_username(&account.username).await?.is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash(&request.password, config.bcrypt_cost)?;
    let user = User::new(account.username, account.email, password_hash);

    users.insert(&user).await?;

    let token = generate_jwt(&user, config)?;
    log::info!("✅ User registered successfully: {}", user.email);

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(&user),
    })
}

// User login
pub async fn login(
    users: &dyn UserStore,
    config: &Config,
    request: &LoginRequest,
) -> AppResult<AuthResponse> {
    let invalid = || AppError::Auth("Invalid credentials".to_string());

    let email = request.email.trim().to_lowercase();
    let user = users.find_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify(&request.password, &user.password)? {
        return Err(invalid());
    }

    let token = generate_jwt(&user, config)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserInfo::from(&user),
    })
}

// Get current user
pub async fn get_current_user(users: &dyn UserStore, user_id: &str) -> AppResult<UserInfo> {
    users
        .find_by_id(user_id)
        .await?
        .map(|user| UserInfo::from(&user))
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Deletes the user record, then best-effort removes its picture file.
pub async fn delete_user_account(
    users: &dyn UserStore,
    config: &Config,
    user_id: &str,
) -> AppResult<()> {
    log::info!("🗑️ Deleting account for user_id: {}", user_id);

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !users.delete(user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Some(path) = user.profile_picture.as_deref() {
        upload_service::remove_stored_file(config, path).await;
    }

    log::info!("✅ Account deleted for user {}", user_id);
    Ok(())
}
