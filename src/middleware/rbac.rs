// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AppUser, UserRole},
};

/// 1. O Trait que define o papel mínimo de uma rota
pub trait RoleDef: Send + Sync + 'static {
    fn min_role() -> UserRole;
}

/// 2. O Extractor (Guardião). Devolve o usuário já conferido.
pub struct RequireRole<T> {
    pub user: AppUser,
    _role: PhantomData<T>,
}

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (o auth_guard já rodou)
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Compara com o papel exigido
        if user.role.rank() < T::min_role().rank() {
            let app_state = AppState::from_ref(state);
            let Ok(locale) = Locale::from_request_parts(parts, state).await;
            tracing::warn!("Acesso negado para {} ({:?}), exige {:?}", user.email, user.role, T::min_role());
            return Err(AppError::PermissionDenied("users.role_insufficient")
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole { user, _role: PhantomData })
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

/// Qualquer pessoa da equipe (painel de conversas e métricas).
pub struct AnyStaff;
impl RoleDef for AnyStaff {
    fn min_role() -> UserRole { UserRole::Operador }
}

/// Gestão de usuários.
pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn min_role() -> UserRole { UserRole::Admin }
}
