use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-Voting Auth Service API",
        version = "1.0.0",
        description = "Account and profile-picture service for the UKM e-voting frontend.\n\n**Authentication:** profile endpoints require a JWT Bearer token from `/api/auth/login` or `/api/auth/register`.\n\nVote casting and tallying happen on-chain and are not served here."
    ),
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::get_profile,
        crate::api::auth::upload_profile,
        crate::api::auth::delete_profile_picture,
        crate::api::auth::delete_profile,
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::models::UserInfo,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and profile management."),
        (name = "Health", description = "Service and database status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_auth_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/profile",
            "/api/auth/upload-profile",
            "/api/auth/delete-profile-picture",
            "/api/auth/delete-profile",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
