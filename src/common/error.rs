// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio e de infraestrutura.
// As variantes carregam CHAVES de tradução, não frases: a frase final
// depende do idioma do cliente e é resolvida em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erro 400 de um único campo (ex: "prompt" ausente)
    #[error("Argumento inválido: {0}")]
    InvalidArgument(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário suspenso")]
    UserSuspended,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão negada: {0}")]
    PermissionDenied(&'static str),

    #[error("Conversa não encontrada")]
    ConversationNotFound,

    #[error("Fatura indisponível no estágio atual")]
    InvoiceUnavailable,

    #[error("Configuração ausente: {0}")]
    MissingConfig(&'static str),

    // Falha do gateway de IA. O texto vai em `details`.
    #[error("Falha no gateway de IA: {0}")]
    AiGateway(String),

    #[error("Falha ao consultar a planilha de cursos: {0}")]
    CourseSheet(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O formato que sai na resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let t = |key: &str| store.translate(lang, key);

        let (status, key, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => t(m.as_ref()),
                            None => t(e.code.as_ref()),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: t("validation.invalid"),
                    details: Some(json!(details)),
                };
            }
            AppError::InvalidArgument(key) => (StatusCode::BAD_REQUEST, key, None),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "users.email_exists", None),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "auth.invalid_credentials", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "auth.invalid_token", None),
            AppError::UserSuspended => (StatusCode::FORBIDDEN, "auth.suspended", None),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "users.not_found", None),
            AppError::PermissionDenied(key) => (StatusCode::FORBIDDEN, key, None),
            AppError::ConversationNotFound => (StatusCode::NOT_FOUND, "conversation.not_found", None),
            AppError::InvoiceUnavailable => (StatusCode::CONFLICT, "invoice.unavailable", None),
            AppError::AiGateway(detail) => {
                tracing::error!("Falha no gateway de IA: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "chat.ai_failed", Some(json!(detail)))
            }
            AppError::MissingConfig(var) => {
                tracing::error!("Variável de ambiente ausente: {}", var);
                (StatusCode::INTERNAL_SERVER_ERROR, "config.missing", Some(json!(var)))
            }
            AppError::CourseSheet(detail) => {
                tracing::error!("Erro na planilha de cursos: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "courses.sheet_failed", None)
            }
            AppError::FontNotFound(detail) => {
                tracing::error!("{}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "invoice.font_missing", None)
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", None)
            }
        };

        ApiError {
            status,
            error: t(key),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn locale(lang: &str) -> Locale {
        Locale(lang.to_string())
    }

    #[test]
    fn permission_denied_is_forbidden_and_localized() {
        let store = I18nStore::new();
        let api = AppError::PermissionDenied("users.hierarchy").to_api_error(&locale("es"), &store);
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert_eq!(api.error, "No puedes modificar un usuario con un rol igual o superior al tuyo.");

        let api = AppError::PermissionDenied("users.hierarchy").to_api_error(&locale("en"), &store);
        assert_eq!(api.error, "You cannot modify a user with a role equal to or higher than yours.");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::new();
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("email");
        err.message = Some("lead.email_invalid".into());
        errors.add("email", err);

        let api = AppError::ValidationError(errors).to_api_error(&locale("es"), &store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["email"][0], "Email inválido");
    }

    #[test]
    fn ai_failures_expose_details() {
        let store = I18nStore::new();
        let api = AppError::AiGateway("quota exceeded".into()).to_api_error(&locale("es"), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.details, Some(json!("quota exceeded")));
    }
}
