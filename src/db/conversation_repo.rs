// src/db/conversation_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Cursor},
    models::conversation::{
        Conversation, ConversationListItem, ConversationStatus, CustomerData, LeadCaptureMeta, Message,
        SalesStage,
    },
};

const CONVERSATION_COLUMNS: &str = "id, messages, status, advisor_name, sales_stage, customer_data, \
     lead_capture, created_at, updated_at";

// Filtros da listagem do painel
#[derive(Debug, Default, Clone)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    // Busca livre nos dados do cliente e nas mensagens
    pub search: Option<String>,
    pub created_on: Option<NaiveDate>,
}

/// O que um turno do chat grava. Campos `None`/`false` ficam como estão no banco,
/// para não apagar o que o formulário de lead gravou durante a chamada à IA.
#[derive(Debug, Clone)]
pub struct TurnUpdate<'a> {
    pub messages: &'a [Message],
    pub stage: SalesStage,
    pub status: Option<ConversationStatus>,
    pub customer: Option<&'a CustomerData>,
    // Só liga a flag; `completed` é do formulário
    pub lead_requested: bool,
}

/// Leitura e escrita usadas pelo turno do chat.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, advisor_name: &str, messages: &[Message]) -> Result<Conversation, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, AppError>;
    async fn update_messages(&self, id: Uuid, messages: &[Message]) -> Result<(), AppError>;
    async fn save_turn(&self, id: Uuid, update: TurnUpdate<'_>) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, advisor_name: &str, messages: &[Message]) -> Result<Conversation, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (advisor_name, messages, status, sales_stage)
            VALUES ($1, $2, 'Iniciado', 'sondear')
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(advisor_name)
        .bind(Json(messages))
        .fetch_one(&self.pool)
        .await?;
        Ok(conversation)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    pub async fn update_messages(&self, id: Uuid, messages: &[Message]) -> Result<(), AppError> {
        sqlx::query("UPDATE conversations SET messages = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(messages))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn save_turn(&self, id: Uuid, update: TurnUpdate<'_>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET messages = $2,
                sales_stage = $3,
                status = COALESCE($4, status),
                customer_data = COALESCE($5, customer_data),
                lead_capture = CASE
                    WHEN $6 THEN COALESCE(lead_capture, '{}'::jsonb) || '{"requested": true}'::jsonb
                    ELSE lead_capture
                END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(update.messages))
        .bind(update.stage)
        .bind(update.status)
        .bind(update.customer.map(Json))
        .bind(update.lead_requested)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Merge do formulário de lead. Cria a conversa se ela ainda não existir.
    pub async fn merge_lead(
        &self,
        id: Uuid,
        customer: &CustomerData,
        lead: &LeadCaptureMeta,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, customer_data, lead_capture, status)
            VALUES ($1, $2, $3, 'Potencial')
            ON CONFLICT (id) DO UPDATE SET
                customer_data = COALESCE(conversations.customer_data, '{}'::jsonb) || EXCLUDED.customer_data,
                lead_capture = COALESCE(conversations.lead_capture, '{}'::jsonb) || EXCLUDED.lead_capture,
                status = 'Potencial',
                updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(Json(customer))
        .bind(Json(lead))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Página da listagem do painel, mais recentes primeiro. Busca `limit + 1` linhas.
    pub async fn list_page(
        &self,
        filter: &ConversationFilter,
        after: Option<Cursor>,
        limit: i64,
    ) -> Result<Vec<ConversationListItem>, AppError> {
        let search = filter.search.as_ref().map(|q| format!("%{}%", q));

        let rows = sqlx::query_as::<_, ConversationListItem>(
            r#"
            SELECT
                id, status, advisor_name, sales_stage, customer_data, lead_capture,
                jsonb_array_length(messages) AS message_count,
                jsonb_path_query_array(messages, '$[0 to 2]') AS preview,
                created_at, updated_at
            FROM conversations
            WHERE ($1::timestamptz IS NULL OR (created_at, id) < ($1, $2))
              AND ($3::conversation_status IS NULL OR status = $3)
              AND ($4::text IS NULL
                   OR customer_data::text ILIKE $4
                   OR messages::text ILIKE $4
                   OR status::text ILIKE $4)
              AND ($5::date IS NULL OR created_at::date = $5)
            ORDER BY created_at DESC, id DESC
            LIMIT $6
            "#,
        )
        .bind(after.map(|c| c.created_at))
        .bind(after.map(|c| c.id))
        .bind(filter.status)
        .bind(search)
        .bind(filter.created_on)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- MÉTRICAS ---

    pub async fn count_by_status(&self) -> Result<Vec<(ConversationStatus, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (ConversationStatus, i64)>(
            "SELECT status, COUNT(*) AS total FROM conversations GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_completed_leads(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE (lead_capture->>'completed')::boolean IS TRUE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn create(&self, advisor_name: &str, messages: &[Message]) -> Result<Conversation, AppError> {
        ConversationRepository::create(self, advisor_name, messages).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
        ConversationRepository::find_by_id(self, id).await
    }

    async fn update_messages(&self, id: Uuid, messages: &[Message]) -> Result<(), AppError> {
        ConversationRepository::update_messages(self, id, messages).await
    }

    async fn save_turn(&self, id: Uuid, update: TurnUpdate<'_>) -> Result<(), AppError> {
        ConversationRepository::save_turn(self, id, update).await
    }
}
