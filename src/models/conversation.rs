// src/models/conversation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::pagination::Cursor;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

// Mapeia o CREATE TYPE conversation_status do banco (valores em espanhol, como no painel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "conversation_status")]
pub enum ConversationStatus {
    Iniciado,
    Potencial,
    Cualificado,
    Cerrado,
    Perdido,
}

impl ConversationStatus {
    pub const ALL: [ConversationStatus; 5] = [
        ConversationStatus::Iniciado,
        ConversationStatus::Potencial,
        ConversationStatus::Cualificado,
        ConversationStatus::Cerrado,
        ConversationStatus::Perdido,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStatus::Iniciado => "Iniciado",
            ConversationStatus::Potencial => "Potencial",
            ConversationStatus::Cualificado => "Cualificado",
            ConversationStatus::Cerrado => "Cerrado",
            ConversationStatus::Perdido => "Perdido",
        }
    }
}

// Estágios do roteiro de coleta de dados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "sales_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SalesStage {
    #[default]
    Sondear,
    RecopilarNombre,
    RecopilarEmail,
    RecopilarPhone,
    RecopilarEstado,
    VerificarDatos,
    EsperandoPago,
    Finalizado,
}

impl SalesStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SalesStage::Sondear => "sondear",
            SalesStage::RecopilarNombre => "recopilar_nombre",
            SalesStage::RecopilarEmail => "recopilar_email",
            SalesStage::RecopilarPhone => "recopilar_phone",
            SalesStage::RecopilarEstado => "recopilar_estado",
            SalesStage::VerificarDatos => "verificar_datos",
            SalesStage::EsperandoPago => "esperando_pago",
            SalesStage::Finalizado => "finalizado",
        }
    }

    pub fn is_collecting(self) -> bool {
        matches!(
            self,
            SalesStage::RecopilarNombre
                | SalesStage::RecopilarEmail
                | SalesStage::RecopilarPhone
                | SalesStage::RecopilarEstado
        )
    }
}

// --- DOCUMENTOS ANINHADOS (JSONB) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: MessageRole,
    #[schema(example = "Hola, quiero información de los cursos")]
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: MessageRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: MessageRole::Model, text: text.into() }
    }
}

// Preenchido aos poucos pelo roteiro (nombre/email/phone/estado)
// ou de uma vez pelo formulário de lead (firstName/lastName/...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl CustomerData {
    pub fn display_name(&self) -> Option<&str> {
        self.full_name.as_deref().or(self.nombre.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        *self == CustomerData::default()
    }
}

// Flags, não uma máquina de estados. `completed` sem `requested` é possível
// pelo formulário inline; não é tratado como inválido.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadCaptureMeta {
    #[serde(default)]
    pub requested: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

// --- CONVERSA (a linha da tabela) ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,

    #[schema(value_type = Vec<Message>)]
    pub messages: Json<Vec<Message>>,

    pub status: ConversationStatus,

    #[schema(example = "Valentina")]
    pub advisor_name: String,

    pub sales_stage: SalesStage,

    #[schema(value_type = Option<CustomerData>)]
    pub customer_data: Option<Json<CustomerData>>,

    #[schema(value_type = Option<LeadCaptureMeta>)]
    pub lead_capture: Option<Json<LeadCaptureMeta>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn cursor(&self) -> Cursor {
        Cursor { created_at: self.created_at, id: self.id }
    }

    pub fn customer(&self) -> CustomerData {
        self.customer_data.as_ref().map(|d| d.0.clone()).unwrap_or_default()
    }

    pub fn lead_meta(&self) -> LeadCaptureMeta {
        self.lead_capture.as_ref().map(|d| d.0.clone()).unwrap_or_default()
    }
}

// Linha resumida para a listagem do painel (sem o histórico inteiro)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListItem {
    pub id: Uuid,
    pub status: ConversationStatus,
    pub advisor_name: String,
    pub sales_stage: SalesStage,
    #[schema(value_type = Option<CustomerData>)]
    pub customer_data: Option<Json<CustomerData>>,
    #[schema(value_type = Option<LeadCaptureMeta>)]
    pub lead_capture: Option<Json<LeadCaptureMeta>>,
    pub message_count: i32,
    #[schema(value_type = Vec<Message>)]
    pub preview: Json<Vec<Message>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationListItem {
    pub fn cursor(&self) -> Cursor {
        Cursor { created_at: self.created_at, id: self.id }
    }
}

// Resposta de um turno do chat
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub conversation_id: Uuid,
    pub reply: Message,
    pub sales_stage: SalesStage,
    pub status: ConversationStatus,
    pub customer_data: CustomerData,
    pub lead_capture_requested: bool,
    pub show_invoice: bool,
    // Aviso para o usuário quando a IA falhou (o turno de desculpas já está em `reply`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
