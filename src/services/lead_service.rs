// src/services/lead_service.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ConversationRepository,
    models::conversation::{CustomerData, LeadCaptureMeta},
};

pub const LEAD_SOURCE: &str = "chat-inline-form";
pub const LEAD_METHOD: &str = "inline-form";

// Dados já validados do formulário inline
#[derive(Debug, Clone)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub consent: bool,
}

/// Monta o que vai para o banco. O formulário marca `requested` e `completed` de uma vez.
pub fn lead_documents(lead: &NewLead, now: DateTime<Utc>) -> (CustomerData, LeadCaptureMeta) {
    let first_name = lead.first_name.trim().to_string();
    let last_name = lead.last_name.as_deref().map(str::trim).unwrap_or_default().to_string();
    let full_name = format!("{} {}", first_name, last_name).trim().to_string();

    let customer = CustomerData {
        first_name: Some(first_name),
        last_name: Some(last_name),
        full_name: Some(full_name),
        email: Some(lead.email.trim().to_string()),
        phone: Some(lead.phone.trim().to_string()),
        consent: Some(lead.consent),
        source: Some(LEAD_SOURCE.to_string()),
        collected_at: Some(now),
        ..Default::default()
    };

    let meta = LeadCaptureMeta {
        requested: true,
        completed: true,
        completed_at: Some(now),
        method: Some(LEAD_METHOD.to_string()),
    };

    (customer, meta)
}

#[derive(Clone)]
pub struct LeadService {
    conversation_repo: ConversationRepository,
}

impl LeadService {
    pub fn new(conversation_repo: ConversationRepository) -> Self {
        Self { conversation_repo }
    }

    /// Mescla o lead na conversa e promove o status para `Potencial`.
    pub async fn capture(&self, conversation_id: Uuid, lead: NewLead) -> Result<(), AppError> {
        let (customer, meta) = lead_documents(&lead, Utc::now());
        self.conversation_repo
            .merge_lead(conversation_id, &customer, &meta)
            .await?;

        tracing::info!("📝 Lead capturado na conversa {}", conversation_id);
        Ok(())
    }
}
