// src/handlers/invoices.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale, models::invoice::Invoice};

// GET /api/conversations/{id}/invoice
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/invoice",
    tag = "Invoice",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Fatura da assinatura", body = Invoice),
        (status = 404, description = "Conversa não encontrada"),
        (status = 409, description = "Pagamento ainda não confirmado")
    )
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .invoice_for(conversation_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoice)))
}

// GET /api/conversations/{id}/invoice.pdf
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/invoice.pdf",
    tag = "Invoice",
    params(("id" = Uuid, Path, description = "ID da conversa")),
    responses(
        (status = 200, description = "Fatura em PDF", content_type = "application/pdf"),
        (status = 409, description = "Pagamento ainda não confirmado")
    )
)]
pub async fn get_invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(conversation_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (invoice, pdf_bytes) = app_state
        .invoice_service
        .invoice_pdf(conversation_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"factura_{}.pdf\"", invoice.number),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
