// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AnyStaff, RequireRole},
    },
    // Importamos os models para referenciar no Swagger
    models::dashboard::DashboardMetrics,
};

// GET /api/admin/metrics
#[utoipa::path(
    get,
    path = "/api/admin/metrics",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Totais por status, leads e taxa de conversão", body = DashboardMetrics),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AnyStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = app_state
        .dashboard_service
        .get_metrics()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(metrics)))
}
