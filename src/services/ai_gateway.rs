// src/services/ai_gateway.rs

//! Gateway para o modelo generativo.
//!
//! O resto do sistema só conhece o trait [`AiGateway`]; a implementação de
//! produção ([`GeminiClient`]) fala com a API REST `generateContent` do Gemini.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    models::conversation::{Message, MessageRole},
};

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system_prompt: Option<String>,
    /// Turnos anteriores, sem o `prompt` atual.
    pub history: Vec<Message>,
    pub prompt: String,
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AppError>;
}

// --- GEMINI ---

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain",
        }
    }
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    }
}

// A API exige que o histórico comece com um turno do usuário;
// a saudação do assessor (turno "model") é descartada.
fn build_contents<'a>(history: &'a [Message], prompt: &'a str) -> Vec<Content<'a>> {
    history
        .iter()
        .skip_while(|m| m.role == MessageRole::Model)
        .map(|m| Content {
            role: Some(role_name(m.role)),
            parts: vec![Part { text: &m.text }],
        })
        .chain(std::iter::once(Content {
            role: Some("user"),
            parts: vec![Part { text: prompt }],
        }))
        .collect()
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() { None } else { Some(text) }
}

#[async_trait]
impl AiGateway for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfig("GEMINI_API_KEY"))?;

        let body = GenerateContentRequest {
            contents: build_contents(&request.history, &request.prompt),
            system_instruction: request
                .system_prompt
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|text| Content {
                    role: None,
                    parts: vec![Part { text }],
                }),
            generation_config: GenerationConfig::default(),
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );

        tracing::debug!("Enviando {} turnos para o Gemini ({})", body.contents.len(), self.config.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiGateway(format!("Falha ao enviar a requisição: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorBody>(&error_text)
                .map(|b| b.error.message)
                .unwrap_or(error_text);
            return Err(AppError::AiGateway(format!("Gemini respondeu {}: {}", status.as_u16(), message)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiGateway(format!("Resposta inválida do Gemini: {}", e)))?;

        extract_text(parsed).ok_or_else(|| AppError::AiGateway("O Gemini não retornou texto".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leading_model_turns_are_dropped() {
        let history = vec![
            Message::model("Hola! Mi nombre es Sofía"),
            Message::user("Hola"),
            Message::model("¿En qué te ayudo?"),
        ];
        let contents = build_contents(&history, "Quiero un curso");

        let roles: Vec<_> = contents.iter().map(|c| c.role.unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(contents.last().unwrap().parts[0].text, "Quiero un curso");
    }

    #[test]
    fn request_body_uses_gemini_field_names() {
        let history = vec![Message::user("Hola")];
        let body = GenerateContentRequest {
            contents: build_contents(&history, "¿Precio?"),
            system_instruction: Some(Content { role: None, parts: vec![Part { text: "Eres un asesor" }] }),
            generation_config: GenerationConfig::default(),
            safety_settings: vec![],
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["systemInstruction"], json!({ "parts": [{ "text": "Eres un asesor" }] }));
        assert_eq!(value["generationConfig"]["topK"], 64);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(value["contents"][1]["role"], "user");
    }

    #[test]
    fn text_is_joined_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hola, " }, { "text": "claro" }] } }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("Hola, claro"));

        let blocked: GenerateContentResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(extract_text(blocked).is_none());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let err = client
            .generate(GenerateRequest { prompt: "hola".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingConfig("GEMINI_API_KEY")));
    }
}
