use std::sync::Arc;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{debug, error, info};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::*;
use crate::password::{hash_password, verify_password, DECOY_HASH};
use crate::repo::{Repo, RepoError};
use crate::token::TokenService;

const MIN_PASSWORD_LEN: usize = 6;

pub fn config(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().content_type_required(false);
    cfg.app_data(json.error_handler(|err, _req: &HttpRequest| {
        debug!(error = %err, "rejected JSON body");
        ApiError::Validation.into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        debug!(error = %err, "rejected query string");
        ApiError::Validation.into()
    }))
    .route("/healthz", web::get().to(healthz))
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    )
    .route("/me", web::get().to(me))
    .service(
        web::resource("/tracked")
            .route(web::get().to(get_tracked))
            .route(web::put().to(put_tracked)),
    );
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo>, pub tokens: TokenService }

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, tokens: TokenService) -> Self { Self { repo, tokens } }
}

// byte length, not chars
fn password_long_enough(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}

fn parse_mode(query: &ModeQuery) -> Result<Mode, ApiError> {
    query.mode.as_deref().unwrap_or_default().parse().map_err(|_| ApiError::Validation)
}

fn blocking_failed(e: actix_web::error::BlockingError) -> ApiError {
    error!(error = %e, "blocking task failed");
    ApiError::Internal
}

pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 409, description = "Email already registered", body = ApiErrorBody)
    )
)]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let RegisterRequest { email, password, name } = payload.into_inner();
    let (email, name) = (email.trim(), name.trim());
    if email.is_empty() || name.is_empty() || !password_long_enough(&password) {
        return Err(ApiError::Validation);
    }

    let hash = web::block(move || hash_password(&password)).await.map_err(blocking_failed)??;
    let user = data.repo.create_user(email, name, &hash).await?;
    let token = data.tokens.issue(&user.id)?;
    info!(user_id = %user.id, "user registered");

    Ok(HttpResponse::Ok().json(AuthResponse { token, user: user.into() }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ApiErrorBody)
    )
)]
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = payload.into_inner();
    let email = email.trim();
    if email.is_empty() || !password_long_enough(&password) {
        return Err(ApiError::Validation);
    }

    // unknown email and wrong password must be indistinguishable, in body and in timing
    let user = match data.repo.find_user_by_email(email).await {
        Ok(user) => Some(user),
        Err(RepoError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    let stored = user.as_ref().map_or_else(|| DECOY_HASH.to_string(), |u| u.password_hash.clone());
    let ok = web::block(move || verify_password(&stored, &password)).await.map_err(blocking_failed)?;
    let user = match user {
        Some(user) if ok => user,
        _ => return Err(ApiError::Unauthorized),
    };
    let token = data.tokens.issue(&user.id)?;
    info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse { token, user: user.into() }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = data.repo.find_user_by_id(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(MeResponse { user: user.into() }))
}

#[utoipa::path(
    get,
    path = "/tracked",
    tag = "tracked",
    params(("mode" = Mode, Query, description = "Collection scope: pvp or pve")),
    responses(
        (status = 200, description = "Tracked items (empty when never written)", body = TrackedItemsResponse),
        (status = 400, description = "Invalid mode", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_tracked(
    auth: AuthUser,
    data: web::Data<AppState>,
    query: web::Query<ModeQuery>,
) -> Result<HttpResponse, ApiError> {
    let mode = parse_mode(&query)?;
    let items = data.repo.get_tracked(&auth.user_id, mode).await?;
    Ok(HttpResponse::Ok().json(TrackedItemsResponse { items }))
}

#[utoipa::path(
    put,
    path = "/tracked",
    tag = "tracked",
    params(("mode" = Mode, Query, description = "Collection scope: pvp or pve")),
    request_body = PutTrackedRequest,
    responses(
        (status = 200, description = "Collection replaced; echoes what was written", body = TrackedItemsResponse),
        (status = 400, description = "Invalid mode or items", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_tracked(
    auth: AuthUser,
    data: web::Data<AppState>,
    query: web::Query<ModeQuery>,
    payload: web::Json<PutTrackedRequest>,
) -> Result<HttpResponse, ApiError> {
    let mode = parse_mode(&query)?;
    let items = payload.into_inner().items.unwrap_or_default();
    if let Err(reason) = validate_items(&items) {
        debug!(%reason, "rejected tracked items");
        return Err(ApiError::Validation);
    }
    let count = items.len();
    let items = data.repo.put_tracked(&auth.user_id, mode, items).await?;
    info!(user_id = %auth.user_id, %mode, count, "tracked items replaced");
    Ok(HttpResponse::Ok().json(TrackedItemsResponse { items }))
}
