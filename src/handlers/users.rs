// src/handlers/users.rs

// Gestão de usuários da equipe (antes eram funções "callable" privilegiadas).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PageParams,
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    models::auth::{AppUser, UserRole},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(email(message = "users.email_invalid"))]
    #[schema(example = "operador@studyx.com")]
    pub email: String,

    #[validate(length(min = 6, message = "auth.password_short"))]
    pub password: String,

    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRolePayload {
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SuspensionPayload {
    pub suspend: bool,
}

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Users",
    params(
        ("limit" = Option<i64>, Query, description = "Tamanho da página (padrão 20, máx. 100)"),
        ("cursor" = Option<String>, Query, description = "Cursor devolvido pela página anterior")
    ),
    responses(
        (status = 200, description = "Página de usuários"),
        (status = 403, description = "Exige admin ou superadmin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .user_service
        .list_users(&params)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

// POST /api/admin/users
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = AppUser),
        (status = 403, description = "Hierarquia não permite"),
        (status = 409, description = "E-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<AdminOnly>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .create_user(&guard.user, &payload.email, &payload.password, payload.role)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/admin/users/{uid}/role
#[utoipa::path(
    put,
    path = "/api/admin/users/{uid}/role",
    tag = "Users",
    request_body = UpdateRolePayload,
    params(("uid" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Papel atualizado", body = AppUser),
        (status = 403, description = "Hierarquia não permite"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_role(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<AdminOnly>,
    Path(uid): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .update_role(&guard.user, uid, payload.role)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// PUT /api/admin/users/{uid}/suspension
#[utoipa::path(
    put,
    path = "/api/admin/users/{uid}/suspension",
    tag = "Users",
    request_body = SuspensionPayload,
    params(("uid" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Suspensão alterada", body = AppUser),
        (status = 400, description = "Tentativa de auto-suspensão"),
        (status = 403, description = "Hierarquia não permite")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_user_suspension(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<AdminOnly>,
    Path(uid): Path<Uuid>,
    Json(payload): Json<SuspensionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user = app_state
        .user_service
        .toggle_suspension(&guard.user, uid, payload.suspend)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}
