// src/services/dashboard_service.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::ConversationRepository,
    models::{
        conversation::ConversationStatus,
        dashboard::{DashboardMetrics, StatusCount},
    },
};

#[derive(Clone)]
pub struct DashboardService {
    repo: ConversationRepository,
}

impl DashboardService {
    pub fn new(repo: ConversationRepository) -> Self {
        Self { repo }
    }

    pub async fn get_metrics(&self) -> Result<DashboardMetrics, AppError> {
        let counts = self.repo.count_by_status().await?;
        let leads_captured = self.repo.count_completed_leads().await?;
        Ok(build_metrics(&counts, leads_captured))
    }
}

/// Todos os status aparecem, mesmo com zero, na ordem do funil.
pub fn build_metrics(counts: &[(ConversationStatus, i64)], leads_captured: i64) -> DashboardMetrics {
    let count_of = |status: ConversationStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, total)| *total)
            .unwrap_or(0)
    };

    let by_status: Vec<StatusCount> = ConversationStatus::ALL
        .iter()
        .map(|&status| StatusCount { status: status.as_str().to_string(), total: count_of(status) })
        .collect();

    let total_conversations: i64 = by_status.iter().map(|s| s.total).sum();
    let closed_sales = count_of(ConversationStatus::Cerrado);

    let conversion_rate = if total_conversations == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(closed_sales) * Decimal::ONE_HUNDRED / Decimal::from(total_conversations)).round_dp(2)
    };

    DashboardMetrics { total_conversations, by_status, leads_captured, closed_sales, conversion_rate }
}
