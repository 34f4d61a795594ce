// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    #[schema(example = "Potencial")]
    pub status: String,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    #[schema(example = 1234)]
    pub total_conversations: i64,
    pub by_status: Vec<StatusCount>,
    #[schema(example = 87)]
    pub leads_captured: i64,
    #[schema(example = 12)]
    pub closed_sales: i64,
    // Percentual de conversas que chegaram a "Cerrado"
    #[schema(example = 4.5)]
    pub conversion_rate: Decimal,
}
