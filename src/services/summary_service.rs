// src/services/summary_service.rs

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, text::truncate_chars},
    models::conversation::{Message, MessageRole},
    services::ai_gateway::{AiGateway, GenerateRequest},
};

pub const MAX_TRANSCRIPT_CHARS: usize = 8000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ConversationSummary {
    /// Texto completo devolvido pelo modelo.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub necesidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accion: Option<String>,
}

pub fn transcript(messages: &[Message]) -> String {
    let joined = messages
        .iter()
        .map(|m| {
            let speaker = match m.role {
                MessageRole::User => "Cliente",
                MessageRole::Model => "Asesor",
            };
            format!("{}: {}", speaker, m.text).trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&joined, MAX_TRANSCRIPT_CHARS).to_string()
}

pub fn summary_prompt(transcript: &str) -> String {
    format!(
        "Resume la siguiente conversación entre un cliente y un asesor. Devuelve:\n\
         1. Contexto breve (1 línea)\n\
         2. Necesidad principal del cliente\n\
         3. Cursos (solo si fueron mencionados literalmente, no inventes ninguno). \
         Si no se mencionan, indica \"Sin cursos mencionados\".\n\
         4. Estado actual / siguiente acción recomendada\n\n\
         Formato:\nContexto: ...\nNecesidad: ...\nCursos: ...\nAcción: ...\n\n\
         Conversación:\n{}",
        transcript
    )
}

/// Separa os quatro campos do formato pedido. Campos ausentes ficam `None`.
pub fn parse_summary(text: &str) -> ConversationSummary {
    let mut summary = ConversationSummary { summary: text.trim().to_string(), ..Default::default() };

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['*', '-', ' ']);
        let Some((label, value)) = line.split_once(':') else { continue };
        let value = value.trim().trim_matches('*').trim();
        if value.is_empty() {
            continue;
        }
        let slot = match label.trim().trim_matches('*').to_lowercase().as_str() {
            "contexto" => &mut summary.contexto,
            "necesidad" => &mut summary.necesidad,
            "cursos" => &mut summary.cursos,
            "acción" | "accion" => &mut summary.accion,
            _ => continue,
        };
        slot.get_or_insert_with(|| value.to_string());
    }
    summary
}

#[derive(Clone)]
pub struct SummaryService {
    ai: Arc<dyn AiGateway>,
}

impl SummaryService {
    pub fn new(ai: Arc<dyn AiGateway>) -> Self {
        Self { ai }
    }

    pub async fn summarize(&self, messages: &[Message]) -> Result<ConversationSummary, AppError> {
        if messages.is_empty() {
            return Err(AppError::InvalidArgument("summary.no_messages"));
        }

        let prompt = summary_prompt(&transcript(messages));
        let text = self
            .ai
            .generate(GenerateRequest { system_prompt: None, history: Vec::new(), prompt })
            .await?;

        Ok(parse_summary(&text))
    }
}
