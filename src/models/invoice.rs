// src/models/invoice.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::conversation::CustomerData;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[schema(example = "Suscripción Mensual - Acceso Total Studyx")]
    pub description: String,
    #[schema(example = 25.00)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[schema(example = "INV-1718236800000")]
    pub number: String,
    pub conversation_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub bill_to: CustomerData,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
}
