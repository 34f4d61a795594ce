// src/handlers/chat.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::conversation::{Conversation, Message, TurnResult},
    services::summary_service::ConversationSummary,
};

// =============================================================================
//  ÁREA 1: CHAMADA AVULSA AO MODELO
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub history: Vec<Message>,
    #[schema(example = "¿Qué cursos de contabilidad tienen?")]
    pub prompt: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub text: String,
}

// POST /api/chat
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Resposta do modelo", body = ChatResponse),
        (status = 400, description = "Falta o prompt"),
        (status = 500, description = "Falha da IA (com `details`)")
    )
)]
pub async fn chat(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ChatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let text = app_state
        .chat_service
        .chat_once(payload.history, payload.prompt.as_deref().unwrap_or_default(), payload.system_prompt)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ChatResponse { text })))
}

// =============================================================================
//  ÁREA 2: SESSÃO DE CONVERSA
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessagePayload {
    #[schema(example = "Juan Perez")]
    pub text: String,
}

// POST /api/conversations
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Chat",
    responses(
        (status = 201, description = "Conversa iniciada com a saudação do assessor", body = Conversation)
    )
)]
pub async fn start_conversation(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = app_state
        .chat_service
        .start_session()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(conversation)))
}

// POST /api/conversations/{id}/messages
#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    tag = "Chat",
    request_body = SendMessagePayload,
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Resposta do turno", body = TurnResult),
        (status = 400, description = "Mensagem vazia"),
        (status = 404, description = "Conversa não encontrada")
    )
)]
pub async fn send_message(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let turn = app_state
        .chat_service
        .handle_turn(conversation_id, &payload.text)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(turn)))
}

// =============================================================================
//  ÁREA 3: RESUMO
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SummarizePayload {
    #[serde(default)]
    pub messages: Vec<Message>,
}

// POST /api/summarize-conversation
#[utoipa::path(
    post,
    path = "/api/summarize-conversation",
    tag = "Chat",
    request_body = SummarizePayload,
    responses(
        (status = 200, description = "Resumo em quatro campos", body = ConversationSummary),
        (status = 400, description = "Sem mensagens")
    )
)]
pub async fn summarize_conversation(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SummarizePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .summary_service
        .summarize(&payload.messages)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
