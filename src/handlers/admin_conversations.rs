// src/handlers/admin_conversations.rs

// Painel: listagem, transcrição e exportação das conversas.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::PageParams,
    },
    config::AppState,
    db::ConversationFilter,
    middleware::{
        i18n::Locale,
        rbac::{AnyStaff, RequireRole},
    },
    models::conversation::{Conversation, ConversationStatus},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    /// Tamanho da página (padrão 20, máx. 100)
    pub limit: Option<i64>,
    /// Cursor devolvido pela página anterior
    pub cursor: Option<String>,
    #[param(value_type = Option<String>, example = "Potencial")]
    pub status: Option<ConversationStatus>,
    /// Busca no nome, e-mail, telefone e mensagens
    pub search: Option<String>,
    /// Dia de criação (AAAA-MM-DD)
    pub date: Option<String>,
}

impl ConversationQuery {
    pub fn into_parts(self) -> Result<(ConversationFilter, PageParams), AppError> {
        let created_on = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|_| AppError::InvalidArgument("filters.date_invalid"))?;

        let filter = ConversationFilter {
            status: self.status,
            search: self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            created_on,
        };
        Ok((filter, PageParams { limit: self.limit, cursor: self.cursor }))
    }
}

// GET /api/admin/conversations
#[utoipa::path(
    get,
    path = "/api/admin/conversations",
    tag = "Admin",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Página de conversas (mais recentes primeiro)"),
        (status = 400, description = "Filtro ou cursor inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_conversations(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AnyStaff>,
    Query(query): Query<ConversationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (filter, params) = query
        .into_parts()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let page = app_state
        .conversation_service
        .list(&filter, &params)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/admin/conversations/export
#[utoipa::path(
    get,
    path = "/api/admin/conversations/export",
    tag = "Admin",
    params(ConversationQuery),
    responses(
        (status = 200, description = "CSV com as conversas do filtro", content_type = "text/csv")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_conversations(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<AnyStaff>,
    Query(query): Query<ConversationQuery>,
) -> Result<Response, ApiError> {
    let (filter, _) = query
        .into_parts()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let csv = app_state
        .conversation_service
        .export_csv(&filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("📤 Exportação de conversas por {}", guard.user.email);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"conversaciones.csv\""),
    ];
    Ok((headers, csv).into_response())
}

// GET /api/admin/conversations/{id}
#[utoipa::path(
    get,
    path = "/api/admin/conversations/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Conversa com a transcrição completa", body = Conversation),
        (status = 404, description = "Conversa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_conversation(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AnyStaff>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = app_state
        .conversation_service
        .get(conversation_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(conversation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_splits_into_filter_and_page() {
        let query = ConversationQuery {
            limit: Some(50),
            status: Some(ConversationStatus::Cerrado),
            search: Some("  juan ".into()),
            date: Some("2024-06-12".into()),
            ..Default::default()
        };
        let (filter, params) = query.into_parts().unwrap();

        assert_eq!(filter.status, Some(ConversationStatus::Cerrado));
        assert_eq!(filter.search.as_deref(), Some("juan"));
        assert_eq!(filter.created_on, NaiveDate::from_ymd_opt(2024, 6, 12));
        assert_eq!(params.page_size(), 50);
    }

    #[test]
    fn bad_dates_are_rejected() {
        let query = ConversationQuery { date: Some("12/06/2024".into()), ..Default::default() };
        assert!(matches!(query.into_parts(), Err(AppError::InvalidArgument("filters.date_invalid"))));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let query = ConversationQuery { search: Some("   ".into()), date: Some("".into()), ..Default::default() };
        let (filter, _) = query.into_parts().unwrap();
        assert!(filter.search.is_none());
        assert!(filter.created_on.is_none());
    }
}
