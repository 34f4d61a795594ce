// src/handlers/dev.rs

// Helpers de desenvolvimento. Respondem 403 quando APP_ENV=production.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::MaybeAuthenticated, i18n::Locale},
    services::user_service::DevCaller,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetLinkPayload {
    #[schema(example = "operador@studyx.com")]
    pub email: Option<String>,
    pub dev_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetLinkResponse {
    #[schema(example = "http://localhost:3000/reset-password?token=...")]
    pub link: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordPayload {
    pub uid: Option<Uuid>,
    pub email: Option<String>,
    // Menos de 8 caracteres: uma senha aleatória é gerada
    pub new_password: Option<String>,
    pub dev_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetPasswordResponse {
    pub uid: Uuid,
    pub password: String,
}

// POST /api/dev/password-reset-link
#[utoipa::path(
    post,
    path = "/api/dev/password-reset-link",
    tag = "Dev",
    request_body = ResetLinkPayload,
    responses(
        (status = 200, description = "Link de redefinição", body = ResetLinkResponse),
        (status = 403, description = "Produção ou sem autorização")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn password_reset_link(
    State(app_state): State<AppState>,
    locale: Locale,
    MaybeAuthenticated(user): MaybeAuthenticated,
    Json(payload): Json<ResetLinkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::InvalidArgument("dev.missing_email").to_api_error(&locale, &app_state.i18n_store))?;

    let caller = DevCaller { user: user.as_ref(), dev_key: payload.dev_key.as_deref() };
    let link = app_state
        .user_service
        .dev_password_reset_link(caller, email)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ResetLinkResponse { link })))
}

// POST /api/dev/set-password
#[utoipa::path(
    post,
    path = "/api/dev/set-password",
    tag = "Dev",
    request_body = SetPasswordPayload,
    responses(
        (status = 200, description = "Senha definida", body = SetPasswordResponse),
        (status = 400, description = "Falta uid ou email"),
        (status = 403, description = "Produção ou sem autorização")
    ),
    security((), ("api_jwt" = []))
)]
pub async fn set_password(
    State(app_state): State<AppState>,
    locale: Locale,
    MaybeAuthenticated(user): MaybeAuthenticated,
    Json(payload): Json<SetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = DevCaller { user: user.as_ref(), dev_key: payload.dev_key.as_deref() };
    let email = payload.email.as_deref().map(str::trim).filter(|e| !e.is_empty());

    let result = app_state
        .user_service
        .dev_set_password(caller, payload.uid, email, payload.new_password.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(SetPasswordResponse { uid: result.uid, password: result.password })))
}
