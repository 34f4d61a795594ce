// src/services/conversation_service.rs

// Consultas do painel sobre as conversas (listagem, transcrição, exportação).

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Cursor, Page, PageParams, MAX_PAGE_SIZE},
    },
    db::{ConversationFilter, ConversationRepository},
    models::conversation::{Conversation, ConversationListItem},
};

// Limite de segurança da exportação
const MAX_EXPORT_ROWS: usize = 10_000;

const CSV_HEADER: [&str; 10] = [
    "id",
    "createdAt",
    "updatedAt",
    "status",
    "salesStage",
    "advisorName",
    "customerName",
    "email",
    "phone",
    "messageCount",
];

#[derive(Clone)]
pub struct ConversationService {
    repo: ConversationRepository,
}

impl ConversationService {
    pub fn new(repo: ConversationRepository) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        filter: &ConversationFilter,
        params: &PageParams,
    ) -> Result<Page<ConversationListItem>, AppError> {
        let page_size = params.page_size();
        let rows = self.repo.list_page(filter, params.cursor()?, page_size).await?;
        Ok(Page::from_rows(rows, page_size, ConversationListItem::cursor))
    }

    pub async fn get(&self, id: Uuid) -> Result<Conversation, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::ConversationNotFound)
    }

    /// Percorre todas as páginas do filtro e devolve um CSV.
    pub async fn export_csv(&self, filter: &ConversationFilter) -> Result<String, AppError> {
        let mut rows: Vec<ConversationListItem> = Vec::new();
        let mut after: Option<Cursor> = None;

        loop {
            let page = self.repo.list_page(filter, after, MAX_PAGE_SIZE).await?;
            let page = Page::from_rows(page, MAX_PAGE_SIZE, ConversationListItem::cursor);
            after = page.items.last().map(ConversationListItem::cursor);
            rows.extend(page.items);

            if !page.has_more || rows.len() >= MAX_EXPORT_ROWS {
                break;
            }
        }

        if rows.len() >= MAX_EXPORT_ROWS {
            tracing::warn!("Exportação truncada em {} conversas", MAX_EXPORT_ROWS);
            rows.truncate(MAX_EXPORT_ROWS);
        }

        Ok(to_csv(&rows))
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(rows: &[ConversationListItem]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for row in rows {
        let customer = row.customer_data.as_ref().map(|c| c.0.clone()).unwrap_or_default();
        let fields = [
            row.id.to_string(),
            row.created_at.to_rfc3339(),
            row.updated_at.to_rfc3339(),
            row.status.as_str().to_string(),
            row.sales_stage.as_str().to_string(),
            row.advisor_name.clone(),
            customer.display_name().unwrap_or_default().to_string(),
            customer.email.unwrap_or_default(),
            customer.phone.unwrap_or_default(),
            row.message_count.to_string(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}
