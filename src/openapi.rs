use crate::error::{ApiErrorBody, ErrorDetail};
use crate::models::{
    AuthResponse, LoginRequest, MeResponse, Mode, PutTrackedRequest, RegisterRequest, TrackedItem,
    TrackedItemsResponse, User,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::register,
        crate::routes::login,
        crate::routes::me,
        crate::routes::get_tracked,
        crate::routes::put_tracked,
    ),
    components(schemas(
        User, Mode, TrackedItem, RegisterRequest, LoginRequest, AuthResponse, MeResponse,
        PutTrackedRequest, TrackedItemsResponse, ApiErrorBody, ErrorDetail
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and session identity"),
        (name = "tracked", description = "Per-mode tracked item sync"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
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
