// src/services/role_guard.rs

// Regras de hierarquia para gestão de usuários.
// Funções puras: quem chama já carregou ator e alvo do banco.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{AppUser, UserRole},
};

/// `true` se o ator está estritamente acima do alvo.
pub fn outranks(actor: UserRole, target: UserRole) -> bool {
    actor.rank() > target.rank()
}

pub fn authorize_creation(actor: UserRole, new_role: UserRole) -> Result<(), AppError> {
    match actor {
        UserRole::Superadmin => Ok(()),
        UserRole::Admin if new_role == UserRole::Operador => Ok(()),
        UserRole::Admin => Err(AppError::PermissionDenied("users.admin_only_operators")),
        UserRole::Operador => Err(AppError::PermissionDenied("users.forbidden_create")),
    }
}

pub fn authorize_role_change(actor: &AppUser, target: &AppUser, new_role: UserRole) -> Result<(), AppError> {
    if !outranks(actor.role, target.role) {
        return Err(AppError::PermissionDenied("users.hierarchy"));
    }
    if actor.role == UserRole::Admin && new_role != UserRole::Operador {
        return Err(AppError::PermissionDenied("users.admin_cannot_assign"));
    }
    Ok(())
}

pub fn authorize_suspension(actor: &AppUser, target_uid: Uuid, target_role: UserRole) -> Result<(), AppError> {
    // Vale para qualquer papel, inclusive superadmin
    if actor.uid == target_uid {
        return Err(AppError::InvalidArgument("users.self_suspension"));
    }
    if !outranks(actor.role, target_role) {
        return Err(AppError::PermissionDenied("users.hierarchy"));
    }
    Ok(())
}

/// Ferramentas de desenvolvimento: admin ou superadmin logado.
pub fn can_use_dev_tools(role: UserRole) -> bool {
    role.rank() >= UserRole::Admin.rank()
}

/// Helpers de dev: nunca em produção. Com sessão, vale o papel; sem sessão, a chave de dev.
pub fn authorize_dev_access(
    production: bool,
    caller: Option<UserRole>,
    provided_key: Option<&str>,
    configured_key: Option<&str>,
) -> Result<(), AppError> {
    if production {
        return Err(AppError::PermissionDenied("dev.production"));
    }
    let authorized = match caller {
        Some(role) => can_use_dev_tools(role),
        None => matches!(
            (provided_key, configured_key),
            (Some(given), Some(expected)) if !expected.is_empty() && given == expected
        ),
    };
    if authorized {
        Ok(())
    } else {
        Err(AppError::PermissionDenied("dev.unauthorized"))
    }
}
