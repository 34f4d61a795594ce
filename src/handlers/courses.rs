// src/handlers/courses.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    services::course_matcher::{self, NO_MATCH_REPLY},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CourseQueryPayload {
    #[schema(example = "quiero saber de contabilidad")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseQueryResponse {
    pub response: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSheetResponse {
    // Linhas cruas da planilha; a primeira costuma ser o cabeçalho
    pub values: Vec<Vec<String>>,
}

// POST /api/cursos
#[utoipa::path(
    post,
    path = "/api/cursos",
    tag = "Courses",
    request_body = CourseQueryPayload,
    responses(
        (status = 200, description = "Resposta do catálogo, sem IA", body = CourseQueryResponse),
        (status = 400, description = "Mensagem ausente")
    )
)]
pub async fn match_course(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CourseQueryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            AppError::InvalidArgument("courses.message_required").to_api_error(&locale, &app_state.i18n_store)
        })?;

    let response = course_matcher::answer(&app_state.catalog, message)
        .reply()
        .unwrap_or_else(|| NO_MATCH_REPLY.to_string());

    Ok((StatusCode::OK, Json(CourseQueryResponse { response })))
}

// GET /api/cursos
#[utoipa::path(
    get,
    path = "/api/cursos",
    tag = "Courses",
    responses(
        (status = 200, description = "Planilha de cursos (Google Sheets)", body = CourseSheetResponse),
        (status = 500, description = "Chave ausente ou falha na planilha")
    )
)]
pub async fn list_sheet_courses(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let values = app_state
        .course_sheet_service
        .fetch_rows()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(CourseSheetResponse { values })))
}
