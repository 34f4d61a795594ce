// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::AppUser,
};

// Usuário da sessão, já relido do banco (papel e suspensão atuais)
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AppUser);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

async fn resolve_user(app_state: &AppState, token: &str) -> Result<AppUser, AppError> {
    let user = app_state.auth_service.validate_token(token).await?;
    Ok(user.into())
}

// O middleware em si: sem token válido a requisição não passa
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let user = resolve_user(&app_state, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}

/// Sessão opcional, usada pelas rotas de dev que também aceitam a chave de dev.
/// Token presente mas inválido continua sendo 401.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<AppUser>);

impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeAuthenticated(None));
        };

        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        let user = resolve_user(&app_state, &token)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(MaybeAuthenticated(Some(user)))
    }
}
